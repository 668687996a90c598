use serde::{Deserialize, Serialize};

/// Input for creating a payment
///
/// Which optional fields are required is gateway-specific: ZarinPal and IdPay
/// need a description, IdPay and PayStar need an order id. Each driver checks
/// its own requirements before touching the network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Amount in the gateway's minor currency unit
    pub amount: u64,

    /// URL the payer is sent back to after the payment page
    pub callback_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Merchant order id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,

    /// Per-call credential, overrides the configured token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_id: Option<String>,

    /// ZarinPal only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,

    #[serde(default)]
    pub payer: PayerInfo,
}

impl PaymentRequest {
    pub fn new(amount: u64, callback_url: impl Into<String>) -> Self {
        Self {
            amount,
            callback_url: callback_url.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn with_merchant_id(mut self, merchant_id: impl Into<String>) -> Self {
        self.merchant_id = Some(merchant_id.into());
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    pub fn with_payer(mut self, payer: PayerInfo) -> Self {
        self.payer = payer;
        self
    }
}

/// Optional payer metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayerInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Currency accepted by ZarinPal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Iranian Rial
    Irr,
    /// Iranian Toman
    Irt,
}

/// Input for verifying a payment after the payer returns to the callback
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    /// Authority, id, trackId or ref_num, depending on the gateway
    pub reference: String,

    /// Original amount (ZarinPal, PayStar)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,

    /// Merchant order id (IdPay)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,

    /// Card number from the callback payload (PayStar signature)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_number: Option<String>,

    /// Bank tracking code from the callback payload (PayStar signature)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_id: Option<String>,
}

impl VerifyRequest {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            ..Default::default()
        }
    }

    pub fn with_amount(mut self, amount: u64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn with_card_number(mut self, card_number: impl Into<String>) -> Self {
        self.card_number = Some(card_number.into());
        self
    }

    pub fn with_tracking_code(mut self, tracking_code: impl Into<String>) -> Self {
        self.tracking_code = Some(tracking_code.into());
        self
    }

    pub fn with_merchant_id(mut self, merchant_id: impl Into<String>) -> Self {
        self.merchant_id = Some(merchant_id.into());
        self
    }
}

/// Input for a status lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InquiryRequest {
    pub reference: String,

    /// Merchant order id (IdPay)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_id: Option<String>,
}

impl InquiryRequest {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            ..Default::default()
        }
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    pub fn with_merchant_id(mut self, merchant_id: impl Into<String>) -> Self {
        self.merchant_id = Some(merchant_id.into());
        self
    }
}

/// A created payment, ready for redirect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInitiated {
    /// Gateway transaction reference, consumed by verify/inquiry
    pub reference: String,

    /// Payment page the payer is redirected to
    pub redirect_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,

    /// Gateway fee, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<u64>,

    /// Full gateway payload
    pub raw: serde_json::Value,
}

/// A confirmed payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentVerified {
    pub reference: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,

    /// Masked card number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_hash: Option<String>,

    /// Bank-side reference (ref_id / refNumber / track_id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<String>,

    pub raw: serde_json::Value,
}

/// Result of a status lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInquiry {
    pub reference: String,

    /// Gateway-reported transaction status, verbatim
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<String>,

    pub raw: serde_json::Value,
}
