use crate::domain::{LabelRule, Record};

/// Splits a comma-joined rule field into lower-cased, trimmed, non-empty tokens.
pub fn tokens(field: &str) -> impl Iterator<Item = String> + '_ {
    field
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
}

/// True iff some token of `field` is a substring of any of `haystacks`.
/// An absent or blank field never matches.
fn field_matches(field: Option<&str>, haystacks: &[&str]) -> bool {
    let Some(field) = field else {
        return false;
    };
    tokens(field).any(|t| haystacks.iter().any(|h| h.contains(t.as_str())))
}

/// A rule fires when any one of its conditions holds.
pub fn rule_fires(record: &Record, rule: &LabelRule) -> bool {
    // sender is compared against both the display name and the address
    field_matches(
        rule.sender.as_deref(),
        &[record.sender_name.as_str(), record.sender_address.as_str()],
    ) || field_matches(rule.email.as_deref(), &[record.sender_address.as_str()])
        || field_matches(rule.subject.as_deref(), &[record.subject.as_str()])
        || field_matches(rule.content.as_deref(), &[record.snippet.as_str()])
}

/// Every rule that fires for `record`, in rule order.
pub fn evaluate<'r>(record: &Record, rules: &'r [LabelRule]) -> Vec<&'r LabelRule> {
    rules.iter().filter(|r| rule_fires(record, r)).collect()
}
