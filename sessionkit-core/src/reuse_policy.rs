//! Reuse-policy predicates over the wallet configuration.
//!
//! The configuration is fetched from remote storage and therefore untrusted and
//! possibly partial. The predicates never fail: an absent configuration, identity
//! list or app map is a plain "not used", while a document of the wrong shape
//! yields [`Verdict::Undetermined`], which collapses to `false` so that the
//! advisory never blocks a sign-in.

use serde::Serialize;
use serde_json::{Map, Value};

/// Key of the flag with which the user opted out of the reuse warning.
const HIDE_WARNING_KEY: &str = "hideWarningForReusingIdentity";
const IDENTITIES_KEY: &str = "identities";
const APPS_KEY: &str = "apps";

/// The outcome of a reuse-policy check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, uniffi::Enum)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// The configuration shows the condition holds.
    Yes,
    /// The configuration shows the condition does not hold.
    No,
    /// The configuration could not be inspected. Treated as `No`.
    Undetermined {
        /// What made the configuration unreadable.
        reason: String,
    },
}

impl Verdict {
    /// Collapses the verdict to the fail-open boolean: only `Yes` is `true`.
    #[must_use]
    pub const fn as_bool(&self) -> bool {
        matches!(self, Self::Yes)
    }

    /// Whether the configuration could be inspected.
    #[must_use]
    pub const fn is_determined(&self) -> bool {
        !matches!(self, Self::Undetermined { .. })
    }

    fn undetermined(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        log::debug!("wallet config could not be inspected, defaulting to false: {reason}");
        Self::Undetermined { reason }
    }
}

/// Whether any identity of the wallet has been used with an app other than `app_origin`.
///
/// Always `No` when the user opted out of the reuse warning.
#[must_use]
pub fn evaluate_used_with_other_apps(config: Option<&Value>, app_origin: &str) -> Verdict {
    let config = match as_document(config) {
        Ok(Some(config)) => config,
        Ok(None) => return Verdict::No,
        Err(verdict) => return verdict,
    };

    match config.get(HIDE_WARNING_KEY) {
        None | Some(Value::Null | Value::Bool(false)) => {}
        Some(Value::Bool(true)) => return Verdict::No,
        Some(_) => return Verdict::undetermined(format!("{HIDE_WARNING_KEY} is not a boolean")),
    }

    match identities(config) {
        Ok(identities) => {
            scan_identities(identities, |apps| apps.keys().any(|origin| origin != app_origin))
        }
        Err(verdict) => verdict,
    }
}

/// Whether the wallet has already been registered with `app_origin`.
///
/// With `identity_index` only that identity is checked (`Some(0)` is identity 0);
/// with `None` every identity is scanned.
#[must_use]
pub fn evaluate_used_before(
    config: Option<&Value>,
    identity_index: Option<u32>,
    app_origin: &str,
) -> Verdict {
    let config = match as_document(config) {
        Ok(Some(config)) => config,
        Ok(None) => return Verdict::No,
        Err(verdict) => return verdict,
    };
    let identities = match identities(config) {
        Ok(identities) => identities,
        Err(verdict) => return verdict,
    };

    let Some(index) = identity_index else {
        return scan_identities(identities, |apps| apps.contains_key(app_origin));
    };

    let Some(identity) = usize::try_from(index)
        .ok()
        .and_then(|index| identities.get(index))
    else {
        return Verdict::undetermined(format!("no identity at index {index}"));
    };

    match apps_of(identity) {
        Ok(Some(apps)) if apps.contains_key(app_origin) => Verdict::Yes,
        Ok(_) => Verdict::No,
        Err(reason) => Verdict::undetermined(format!("identity {index}: {reason}")),
    }
}

/// Fail-open form of [`evaluate_used_with_other_apps`].
#[must_use]
pub fn has_used_with_other_apps(config: Option<&Value>, app_origin: &str) -> bool {
    evaluate_used_with_other_apps(config, app_origin).as_bool()
}

/// Fail-open form of [`evaluate_used_before`].
#[must_use]
pub fn has_used_before(
    config: Option<&Value>,
    identity_index: Option<u32>,
    app_origin: &str,
) -> bool {
    evaluate_used_before(config, identity_index, app_origin).as_bool()
}

/// The advisory shown after a wallet is restored from a manually entered secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, uniffi::Record)]
pub struct ReuseAdvisory {
    /// Result of the "used with other apps" check.
    pub used_with_other_apps: Verdict,
    /// Result of the "used with this app before" check, over all identities.
    pub used_before: Verdict,
    /// Whether the user should be warned against reusing the secret with this app.
    pub warn: bool,
}

/// Evaluates whether the user should be warned that the restored wallet is already
/// linked to other applications but not yet to `app_origin`.
#[must_use]
pub fn reuse_advisory(config: Option<&Value>, app_origin: &str) -> ReuseAdvisory {
    let used_with_other_apps = evaluate_used_with_other_apps(config, app_origin);
    let used_before = evaluate_used_before(config, None, app_origin);
    let warn = used_with_other_apps.as_bool() && !used_before.as_bool();
    if warn {
        log::warn!("wallet is already used with other apps, consider not reusing its secret for {app_origin}");
    }
    ReuseAdvisory {
        used_with_other_apps,
        used_before,
        warn,
    }
}

/// Parses a wallet configuration received as JSON text.
///
/// # Errors
/// Returns an `Undetermined` verdict when the text is not valid JSON, to be used in
/// place of evaluating the document.
pub fn parse_wallet_config(json: Option<&str>) -> Result<Option<Value>, Verdict> {
    json.map(serde_json::from_str)
        .transpose()
        .map_err(|err| Verdict::undetermined(format!("wallet config is not valid JSON: {err}")))
}

/// An absent or `null` document is a wallet that is not configured yet.
fn as_document(config: Option<&Value>) -> Result<Option<&Map<String, Value>>, Verdict> {
    match config {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(config)) => Ok(Some(config)),
        Some(_) => Err(Verdict::undetermined("wallet config is not an object")),
    }
}

fn identities(config: &Map<String, Value>) -> Result<&[Value], Verdict> {
    match config.get(IDENTITIES_KEY) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(identities)) => Ok(identities.as_slice()),
        Some(_) => Err(Verdict::undetermined(format!("{IDENTITIES_KEY} is not a list"))),
    }
}

fn apps_of(identity: &Value) -> Result<Option<&Map<String, Value>>, String> {
    let identity = identity
        .as_object()
        .ok_or_else(|| "identity is not an object".to_string())?;
    match identity.get(APPS_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(apps)) => Ok(Some(apps)),
        Some(_) => Err(format!("{APPS_KEY} is not a map")),
    }
}

/// Returns `Yes` on the first identity whose app map satisfies `matches`.
///
/// Malformed identities are skipped; when nothing matched and one was skipped the
/// result is `Undetermined`.
fn scan_identities(
    identities: &[Value],
    matches: impl Fn(&Map<String, Value>) -> bool,
) -> Verdict {
    let mut skipped = None;
    for (index, identity) in identities.iter().enumerate() {
        match apps_of(identity) {
            Ok(Some(apps)) if matches(apps) => return Verdict::Yes,
            Ok(_) => {}
            Err(reason) => {
                skipped.get_or_insert_with(|| format!("identity {index}: {reason}"));
            }
        }
    }
    skipped.map_or(Verdict::No, Verdict::undetermined)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_case::test_case;

    use super::*;

    const APP: &str = "https://brace.to";

    fn config_with_apps(apps: &[Value]) -> Value {
        json!({
            "identities": apps.iter().map(|apps| json!({ "apps": apps })).collect::<Vec<_>>()
        })
    }

    #[test]
    fn test_absent_config_is_not_used() {
        assert_eq!(evaluate_used_with_other_apps(None, APP), Verdict::No);
        assert_eq!(evaluate_used_before(None, None, APP), Verdict::No);
        assert_eq!(evaluate_used_before(None, Some(0), APP), Verdict::No);
        assert!(!has_used_with_other_apps(Some(&Value::Null), APP));
    }

    #[test]
    fn test_empty_identity_list_is_not_used() {
        let config = json!({ "identities": [] });
        assert_eq!(evaluate_used_with_other_apps(Some(&config), APP), Verdict::No);
        assert_eq!(evaluate_used_before(Some(&config), None, APP), Verdict::No);

        let config = json!({});
        assert_eq!(evaluate_used_with_other_apps(Some(&config), APP), Verdict::No);
        assert_eq!(evaluate_used_before(Some(&config), None, APP), Verdict::No);
    }

    #[test]
    fn test_only_current_app() {
        let config = config_with_apps(&[json!({ APP: {} })]);
        assert!(!has_used_with_other_apps(Some(&config), APP));
        assert!(has_used_before(Some(&config), None, APP));
    }

    #[test]
    fn test_other_app() {
        let config = config_with_apps(&[json!({ "https://other.example": {} })]);
        assert!(has_used_with_other_apps(Some(&config), APP));
        assert!(!has_used_before(Some(&config), None, APP));
    }

    #[test]
    fn test_current_and_other_app() {
        let config = config_with_apps(&[json!({ "https://a.example": {}, APP: {} })]);
        assert!(has_used_with_other_apps(Some(&config), APP));
        assert!(has_used_before(Some(&config), None, APP));
    }

    #[test_case(json!(true), Verdict::No ; "suppressed")]
    #[test_case(json!(false), Verdict::Yes ; "not suppressed")]
    #[test_case(Value::Null, Verdict::Yes ; "null flag")]
    fn test_hide_warning_flag(flag: Value, expected: Verdict) {
        let config = json!({
            "hideWarningForReusingIdentity": flag,
            "identities": [{ "apps": { "https://other.example": {} } }]
        });
        assert_eq!(evaluate_used_with_other_apps(Some(&config), APP), expected);
    }

    #[test_case(json!("yes") ; "flag is a string")]
    #[test_case(json!(1) ; "flag is a number")]
    fn test_malformed_hide_warning_flag_is_undetermined(flag: Value) {
        let config = json!({
            "hideWarningForReusingIdentity": flag,
            "identities": [{ "apps": { "https://other.example": {} } }]
        });
        let verdict = evaluate_used_with_other_apps(Some(&config), APP);
        assert!(!verdict.is_determined());
        assert!(!verdict.as_bool());
    }

    #[test_case(json!([]) ; "config is a list")]
    #[test_case(json!({ "identities": {} }) ; "identities is a map")]
    #[test_case(json!({ "identities": [42] }) ; "identity is a number")]
    #[test_case(json!({ "identities": [{ "apps": [] }] }) ; "apps is a list")]
    fn test_malformed_config_fails_open(config: Value) {
        let other = evaluate_used_with_other_apps(Some(&config), APP);
        let before = evaluate_used_before(Some(&config), None, APP);
        assert!(matches!(other, Verdict::Undetermined { .. }));
        assert!(matches!(before, Verdict::Undetermined { .. }));
        assert!(!other.as_bool());
        assert!(!before.as_bool());
    }

    #[test]
    fn test_malformed_identity_does_not_hide_later_match() {
        let config = json!({
            "identities": [
                "garbage",
                { "apps": { APP: {} } }
            ]
        });
        assert_eq!(evaluate_used_before(Some(&config), None, APP), Verdict::Yes);
        assert_eq!(evaluate_used_with_other_apps(Some(&config), APP), Verdict::Undetermined {
            reason: "identity 0: identity is not an object".to_string()
        });
    }

    #[test]
    fn test_identity_without_apps_is_not_used() {
        let config = json!({ "identities": [{ "username": "alice.id" }, { "apps": null }] });
        assert_eq!(evaluate_used_with_other_apps(Some(&config), APP), Verdict::No);
        assert_eq!(evaluate_used_before(Some(&config), None, APP), Verdict::No);
        assert_eq!(evaluate_used_before(Some(&config), Some(1), APP), Verdict::No);
    }

    #[test]
    fn test_index_zero_checks_only_first_identity() {
        // Identity 0 has never seen the app, identity 1 has. Index 0 must not fall back
        // to scanning every identity.
        let config = config_with_apps(&[json!({}), json!({ APP: {} })]);
        assert_eq!(evaluate_used_before(Some(&config), Some(0), APP), Verdict::No);
        assert_eq!(evaluate_used_before(Some(&config), Some(1), APP), Verdict::Yes);
        assert_eq!(evaluate_used_before(Some(&config), None, APP), Verdict::Yes);
    }

    #[test]
    fn test_index_out_of_range_is_undetermined() {
        let config = config_with_apps(&[json!({ APP: {} })]);
        let verdict = evaluate_used_before(Some(&config), Some(5), APP);
        assert_eq!(verdict, Verdict::Undetermined {
            reason: "no identity at index 5".to_string()
        });
        assert!(!verdict.as_bool());
    }

    #[test]
    fn test_origin_match_is_exact() {
        let config = config_with_apps(&[json!({ "https://brace.to/": {} })]);
        assert!(!has_used_before(Some(&config), None, APP));
        assert!(has_used_with_other_apps(Some(&config), APP));
    }

    #[test]
    fn test_parse_wallet_config() {
        assert_eq!(parse_wallet_config(None), Ok(None));
        assert_eq!(
            parse_wallet_config(Some(r#"{"identities":[]}"#)),
            Ok(Some(json!({ "identities": [] })))
        );
        let err = parse_wallet_config(Some("{not json")).unwrap_err();
        assert!(!err.is_determined());
    }

    #[test]
    fn test_advisory_warns_when_only_other_apps() {
        let config = config_with_apps(&[json!({ "https://other.example": {} })]);
        let advisory = reuse_advisory(Some(&config), APP);
        assert!(advisory.warn);
        assert_eq!(advisory.used_with_other_apps, Verdict::Yes);
        assert_eq!(advisory.used_before, Verdict::No);
    }

    #[test]
    fn test_advisory_silent_once_registered() {
        let config = config_with_apps(&[json!({ "https://other.example": {}, APP: {} })]);
        assert!(!reuse_advisory(Some(&config), APP).warn);
        assert!(!reuse_advisory(None, APP).warn);
    }
}
