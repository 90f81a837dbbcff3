//! Checkout state machine
//!
//! A session walks `Contact -> Shipping -> Payment -> Submitted`. Each forward
//! move validates the current step's form; failures leave the session where
//! it was and report every offending field. Moving back never loses input.
//! The cart is copied into the session when checkout starts, so later cart
//! edits do not change what is being bought.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::aggregates::{
    CartItem, ContactDetails, Order, OrderDraft, OrderTotals, PaymentMethod, ShippingAddress,
};
use crate::domain::value_objects::OrderId;
use crate::payment::{authorize_with_retry, PaymentError, PaymentGateway, PaymentRequest};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    Contact,
    Shipping,
    Payment,
    Submitted,
}

impl CheckoutStep {
    /// 1-based position shown in the progress bar. `Submitted` is past the last step.
    pub fn number(&self) -> u8 {
        match self { Self::Contact => 1, Self::Shipping => 2, Self::Payment => 3, Self::Submitted => 4 }
    }

    pub fn title(&self) -> &'static str {
        match self { Self::Contact => "Contact", Self::Shipping => "Shipping", Self::Payment => "Payment", Self::Submitted => "Submitted" }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.title()) }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("{step} details are incomplete ({} field(s))", .fields.len())]
    Validation { step: CheckoutStep, fields: Vec<FieldError> },

    #[error("Cannot check out an empty cart")]
    EmptyCart,

    #[error("Cannot {action} from the {from} step")]
    InvalidTransition { from: CheckoutStep, action: &'static str },

    #[error(transparent)]
    Payment(#[from] PaymentError),
}

fn trimmed(value: &mut String) {
    let t = value.trim();
    if t.len() != value.len() { *value = t.to_string(); }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ContactForm {
    #[validate(length(min = 1, message = "Email address is required"))]
    pub email: String,
    pub phone: String,
}

impl ContactForm {
    fn normalize(&mut self) {
        trimmed(&mut self.email);
        trimmed(&mut self.phone);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ShippingForm {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    pub apartment: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "ZIP code is required"))]
    pub zip: String,
    #[validate(length(min = 1, message = "Country is required"))]
    pub country: String,
}

impl Default for ShippingForm {
    fn default() -> Self {
        Self {
            first_name: String::new(), last_name: String::new(), address: String::new(), apartment: String::new(),
            city: String::new(), state: String::new(), zip: String::new(), country: "US".to_string(),
        }
    }
}

impl ShippingForm {
    fn normalize(&mut self) {
        for field in [
            &mut self.first_name, &mut self.last_name, &mut self.address, &mut self.apartment,
            &mut self.city, &mut self.state, &mut self.zip, &mut self.country,
        ] {
            trimmed(field);
        }
    }

    fn to_address(&self) -> ShippingAddress {
        ShippingAddress {
            name: format!("{} {}", self.first_name, self.last_name),
            street: self.address.clone(),
            apartment: (!self.apartment.is_empty()).then(|| self.apartment.clone()),
            city: self.city.clone(),
            state: self.state.clone(),
            zip: self.zip.clone(),
            country: self.country.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CardForm {
    #[validate(length(min = 1, message = "Name on card is required"))]
    pub card_name: String,
    #[validate(length(min = 1, message = "Card number is required"))]
    #[serde(skip_serializing)]
    pub card_number: String,
    #[validate(length(min = 1, message = "Expiry date is required"))]
    pub expiry_date: String,
    #[validate(length(min = 1, message = "CVV is required"))]
    #[serde(skip_serializing)]
    pub cvv: String,
}

impl CardForm {
    fn normalize(&mut self) {
        for field in [&mut self.card_name, &mut self.card_number, &mut self.expiry_date, &mut self.cvv] {
            trimmed(field);
        }
    }

    fn last4(&self) -> Option<String> {
        let digits: Vec<char> = self.card_number.chars().filter(char::is_ascii_digit).collect();
        (digits.len() >= 4).then(|| digits[digits.len() - 4..].iter().collect())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentForm {
    pub payment_method: Option<PaymentMethod>,
    #[serde(flatten)]
    pub card: CardForm,
    pub notes: String,
}

impl Default for PaymentForm {
    fn default() -> Self { Self { payment_method: Some(PaymentMethod::Card), card: CardForm::default(), notes: String::new() } }
}

impl PaymentForm {
    fn normalize(&mut self) {
        self.card.normalize();
        trimmed(&mut self.notes);
    }

    fn check(&self) -> Vec<FieldError> {
        match self.payment_method {
            None => vec![FieldError { field: "payment_method".into(), message: "Select a payment method".into() }],
            Some(PaymentMethod::Card) => field_errors(self.card.validate()),
            Some(PaymentMethod::PayPal) => Vec::new(),
        }
    }
}

fn field_errors(result: Result<(), ValidationErrors>) -> Vec<FieldError> {
    let Err(errors) = result else { return Vec::new() };
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| FieldError {
            field: field.to_string(),
            message: errs
                .first()
                .and_then(|e| e.message.as_ref())
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("{field} is required")),
        })
        .collect();
    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

#[derive(Clone, Debug, Serialize)]
pub struct CheckoutSession {
    step: CheckoutStep,
    items: Vec<CartItem>,
    totals: OrderTotals,
    contact: ContactForm,
    shipping: ShippingForm,
    payment: PaymentForm,
    started_at: DateTime<Utc>,
}

impl CheckoutSession {
    /// Starts checkout over a snapshot of the cart's lines.
    pub fn start(items: Vec<CartItem>) -> Result<Self, CheckoutError> {
        if items.is_empty() { return Err(CheckoutError::EmptyCart); }
        Ok(Self {
            step: CheckoutStep::Contact,
            totals: OrderTotals::for_items(&items),
            items,
            contact: ContactForm::default(),
            shipping: ShippingForm::default(),
            payment: PaymentForm::default(),
            started_at: Utc::now(),
        })
    }

    pub fn step(&self) -> CheckoutStep { self.step }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn totals(&self) -> &OrderTotals { &self.totals }
    pub fn contact(&self) -> &ContactForm { &self.contact }
    pub fn shipping(&self) -> &ShippingForm { &self.shipping }
    pub fn payment(&self) -> &PaymentForm { &self.payment }
    pub fn started_at(&self) -> DateTime<Utc> { self.started_at }
    pub fn is_submitted(&self) -> bool { self.step == CheckoutStep::Submitted }

    pub fn set_contact(&mut self, mut form: ContactForm) -> Result<(), CheckoutError> {
        self.ensure_open("edit contact details")?;
        form.normalize();
        self.contact = form;
        Ok(())
    }

    pub fn set_shipping(&mut self, mut form: ShippingForm) -> Result<(), CheckoutError> {
        self.ensure_open("edit the shipping address")?;
        form.normalize();
        self.shipping = form;
        Ok(())
    }

    pub fn set_payment(&mut self, mut form: PaymentForm) -> Result<(), CheckoutError> {
        self.ensure_open("edit payment details")?;
        form.normalize();
        self.payment = form;
        Ok(())
    }

    /// Checks the form belonging to `step`.
    pub fn validate_step(&self, step: CheckoutStep) -> Result<(), CheckoutError> {
        let fields = match step {
            CheckoutStep::Contact => field_errors(self.contact.validate()),
            CheckoutStep::Shipping => field_errors(self.shipping.validate()),
            CheckoutStep::Payment => self.payment.check(),
            CheckoutStep::Submitted => Vec::new(),
        };
        if fields.is_empty() { Ok(()) } else { Err(CheckoutError::Validation { step, fields }) }
    }

    /// Advances one step if the current step validates.
    pub fn next(&mut self) -> Result<CheckoutStep, CheckoutError> {
        let to = match self.step {
            CheckoutStep::Contact => CheckoutStep::Shipping,
            CheckoutStep::Shipping => CheckoutStep::Payment,
            from => return Err(CheckoutError::InvalidTransition { from, action: "advance" }),
        };
        self.validate_step(self.step)?;
        tracing::debug!(from = %self.step, to = %to, "checkout step advanced");
        self.step = to;
        Ok(to)
    }

    /// Goes back one step. Already on `Contact` stays put.
    pub fn back(&mut self) -> Result<CheckoutStep, CheckoutError> {
        self.step = match self.step {
            CheckoutStep::Contact | CheckoutStep::Shipping => CheckoutStep::Contact,
            CheckoutStep::Payment => CheckoutStep::Shipping,
            CheckoutStep::Submitted => return Err(CheckoutError::InvalidTransition { from: CheckoutStep::Submitted, action: "go back" }),
        };
        Ok(self.step)
    }

    /// Builds the order draft. Every step is re-validated, so stale edits cannot slip through.
    pub fn draft(&self) -> Result<OrderDraft, CheckoutError> {
        if self.step != CheckoutStep::Payment {
            return Err(CheckoutError::InvalidTransition { from: self.step, action: "submit" });
        }
        for step in [CheckoutStep::Contact, CheckoutStep::Shipping, CheckoutStep::Payment] {
            self.validate_step(step)?;
        }
        Ok(OrderDraft {
            id: OrderId::generate(),
            items: self.items.clone(),
            totals: self.totals,
            contact: ContactDetails {
                email: self.contact.email.clone(),
                phone: (!self.contact.phone.is_empty()).then(|| self.contact.phone.clone()),
            },
            shipping_address: self.shipping.to_address(),
            payment_method: self.payment.payment_method.unwrap_or_default(),
            notes: (!self.payment.notes.is_empty()).then(|| self.payment.notes.clone()),
        })
    }

    /// Charges the draft through `gateway` and returns the placed order.
    ///
    /// A declined or failed payment leaves the session on the payment step.
    pub async fn submit(&mut self, gateway: &dyn PaymentGateway, max_attempts: u32) -> Result<Order, CheckoutError> {
        let draft = self.draft()?;
        let request = PaymentRequest {
            order_id: draft.id.clone(),
            amount: draft.totals.total,
            method: draft.payment_method,
            email: draft.contact.email.clone(),
            card_last4: match draft.payment_method {
                PaymentMethod::Card => self.payment.card.last4(),
                PaymentMethod::PayPal => None,
            },
        };
        let receipt = authorize_with_retry(gateway, &request, max_attempts).await.map_err(|e| {
            tracing::warn!(order_id = %request.order_id, error = %e, "payment failed");
            CheckoutError::from(e)
        })?;
        self.step = CheckoutStep::Submitted;
        Ok(Order::place(draft, receipt.reference, Utc::now()))
    }

    fn ensure_open(&self, action: &'static str) -> Result<(), CheckoutError> {
        if self.is_submitted() { Err(CheckoutError::InvalidTransition { from: self.step, action }) } else { Ok(()) }
    }
}
