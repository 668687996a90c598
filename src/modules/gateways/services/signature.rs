//! Request signing for gateways that authenticate requests with an HMAC.
//!
//! Messages are `#`-separated fields in a fixed order. Field order and the
//! separator must match the gateway byte-for-byte, otherwise the remote API
//! rejects the request with an opaque auth error.

use hmac::{Hmac, Mac};
use sha2::Sha512;

use crate::core::{AppError, Result};

type HmacSha512 = Hmac<Sha512>;

const SEPARATOR: &str = "#";

/// HMAC-SHA512 over the UTF-8 bytes of `message`, as lowercase hex
pub fn sign(message: &str, key: Option<&str>) -> Result<String> {
    let key = key.filter(|k| !k.is_empty()).ok_or_else(|| {
        AppError::configuration("sign key is required for signature generation")
    })?;

    let mut mac = HmacSha512::new_from_slice(key.as_bytes())
        .map_err(|e| AppError::configuration(format!("invalid sign key: {}", e)))?;
    mac.update(message.as_bytes());

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// `amount#order_id#callback_url`
pub fn create_message(amount: u64, order_id: &str, callback_url: &str) -> String {
    [amount.to_string().as_str(), order_id, callback_url].join(SEPARATOR)
}

/// `amount#ref_num#card_number#tracking_code`
pub fn verify_message(
    amount: u64,
    ref_num: &str,
    card_number: &str,
    tracking_code: &str,
) -> String {
    [amount.to_string().as_str(), ref_num, card_number, tracking_code].join(SEPARATOR)
}
