//! Account identifier helpers.
//!
//! The provider may return an account id suffixed with a domain
//! (`name@domain`); the UI only ever shows the bare name.

/// Strip everything from the first `@` onward.
///
/// `None` maps to the empty string, ids without `@` are returned as is.
pub fn clean_account_id(raw: Option<&str>) -> String {
    match raw {
        Some(id) => id.split_once('@').map_or(id, |(name, _)| name).to_string(),
        None => String::new(),
    }
}
