//! Network block parameter derivation.
//!
//! Turns a [`CredentialBundle`] into the ordered list of `SET_NETWORK`
//! parameters for its security class, and encodes literal values so the
//! daemon reads them verbatim.

use crate::Result;
use crate::api::models::{ConnectionError, CredentialBundle, ParamValue, ParameterSet};
use crate::types::constants::{limits, param, security};
use crate::util::utils::is_hex;

/// Derives the parameter set for `bundle`.
///
/// Rules, applied in order:
///
/// 1. `ssid` is always set.
/// 2. Without a password (and no `key_mgmt` override) the network is open:
///    `key_mgmt NONE`.
/// 3. A password without a username is a pre-shared key: `psk`. A password
///    of exactly 64 hex digits is passed as a raw key rather than a
///    passphrase.
/// 4. A password with a username is enterprise: `key_mgmt WPA-EAP`,
///    `identity`, `password`, `eap PEAP`.
/// 5. `key_mgmt`, `eap`, `phase1` and `phase2` overrides replace the derived
///    value in place, or are appended in that order.
///
/// Never fails; call [`validate_bundle`] first to reject malformed input.
///
/// # Example
///
/// ```rust
/// use wpactl::{CredentialBundle, derive_parameters};
///
/// let params = derive_parameters(&CredentialBundle::new("HomeNet").with_password("secret123"));
/// assert_eq!(params.names(), vec!["ssid", "psk"]);
/// ```
pub fn derive_parameters(bundle: &CredentialBundle) -> ParameterSet {
    let mut params = ParameterSet::default();
    params.set(param::SSID, ParamValue::Literal(bundle.ssid.clone()));

    match (&bundle.password, &bundle.username) {
        (None, _) => {
            if bundle.key_management.is_none() {
                params.set(
                    param::KEY_MGMT,
                    ParamValue::Token(security::KEY_MGMT_NONE.to_string()),
                );
            }
        }
        (Some(password), None) => {
            let value = if is_raw_psk(password) {
                ParamValue::Token(password.to_ascii_lowercase())
            } else {
                ParamValue::Literal(password.clone())
            };
            params.set(param::PSK, value);
        }
        (Some(password), Some(username)) => {
            params.set(
                param::KEY_MGMT,
                ParamValue::Token(security::KEY_MGMT_WPA_EAP.to_string()),
            );
            params.set(param::IDENTITY, ParamValue::Literal(username.clone()));
            params.set(param::PASSWORD, ParamValue::Literal(password.clone()));
            params.set(param::EAP, ParamValue::Token(security::EAP_PEAP.to_string()));
        }
    }

    if let Some(key_mgmt) = &bundle.key_management {
        params.set(param::KEY_MGMT, ParamValue::Token(key_mgmt.trim().to_string()));
    }
    if let Some(eap) = &bundle.eap_method {
        params.set(param::EAP, ParamValue::Token(eap.trim().to_string()));
    }
    if let Some(phase1) = &bundle.phase1 {
        params.set(param::PHASE1, ParamValue::Literal(phase1.clone()));
    }
    if let Some(phase2) = &bundle.phase2 {
        params.set(param::PHASE2, ParamValue::Literal(phase2.clone()));
    }

    params
}

/// Encodes a string so the daemon stores it verbatim.
///
/// Plain values are wrapped in double quotes. The daemon takes everything
/// up to the last quote, so quotes inside the value need no escaping. Values
/// containing control characters cannot be quoted and are sent as unquoted
/// lowercase hex of their UTF-8 bytes instead.
///
/// ```rust
/// use wpactl::encode_literal;
///
/// assert_eq!(encode_literal("Home Net"), "\"Home Net\"");
/// assert_eq!(encode_literal("say \"hi\""), "\"say \"hi\"\"");
/// assert_eq!(encode_literal("a\nb"), "610a62");
/// ```
pub fn encode_literal(value: &str) -> String {
    if value.chars().any(char::is_control) {
        value.bytes().map(|b| format!("{b:02x}")).collect()
    } else {
        format!("\"{value}\"")
    }
}

/// Renders a parameter value as it appears in a `SET_NETWORK` request.
pub(crate) fn wire_value(value: &ParamValue) -> String {
    match value {
        ParamValue::Literal(s) => encode_literal(s),
        ParamValue::Token(s) => s.clone(),
    }
}

/// Rejects bundles the daemon would refuse or misinterpret.
///
/// # Errors
///
/// Returns [`ConnectionError::InvalidCredentials`] if:
/// - the SSID is empty or longer than 32 bytes
/// - an enterprise bundle lacks a username or password
/// - a pre-shared key is not 8-63 printable ASCII characters or 64 hex digits
/// - a `key_mgmt` or `eap` override is empty or contains characters other
///   than ASCII alphanumerics, `-`, `_` and spaces
pub fn validate_bundle(bundle: &CredentialBundle) -> Result<()> {
    if bundle.ssid.is_empty() {
        return Err(ConnectionError::InvalidCredentials(
            "SSID cannot be empty".into(),
        ));
    }
    if bundle.ssid.len() > limits::SSID_MAX_BYTES {
        return Err(ConnectionError::InvalidCredentials(format!(
            "SSID is {} bytes (max {})",
            bundle.ssid.len(),
            limits::SSID_MAX_BYTES
        )));
    }

    if let Some(key_mgmt) = &bundle.key_management {
        validate_token("key management", key_mgmt)?;
    }
    if let Some(eap) = &bundle.eap_method {
        validate_token("EAP method", eap)?;
    }

    if bundle.is_enterprise() {
        if bundle.username.as_deref().is_none_or(|u| u.trim().is_empty()) {
            return Err(ConnectionError::InvalidCredentials(
                "enterprise networks require a username".into(),
            ));
        }
        if bundle.password.as_deref().is_none_or(str::is_empty) {
            return Err(ConnectionError::InvalidCredentials(
                "enterprise networks require a password".into(),
            ));
        }
        return Ok(());
    }

    if let Some(psk) = &bundle.password {
        validate_psk(psk)?;
    }

    Ok(())
}

fn validate_psk(psk: &str) -> Result<()> {
    if is_raw_psk(psk) {
        return Ok(());
    }

    if !psk.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
        return Err(ConnectionError::InvalidCredentials(
            "passphrase must be printable ASCII".into(),
        ));
    }

    let len = psk.len();
    if !(limits::PASSPHRASE_MIN..=limits::PASSPHRASE_MAX).contains(&len) {
        return Err(ConnectionError::InvalidCredentials(format!(
            "passphrase has invalid length: {len} (expected {}-{} characters)",
            limits::PASSPHRASE_MIN,
            limits::PASSPHRASE_MAX
        )));
    }

    Ok(())
}

fn validate_token(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ConnectionError::InvalidCredentials(format!(
            "{what} cannot be empty"
        )));
    }

    let valid = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ' ');
    if !valid {
        return Err(ConnectionError::InvalidCredentials(format!(
            "{what} contains invalid characters: {value:?}"
        )));
    }

    Ok(())
}

fn is_raw_psk(value: &str) -> bool {
    value.len() == limits::RAW_PSK_HEX_LEN && is_hex(value)
}
