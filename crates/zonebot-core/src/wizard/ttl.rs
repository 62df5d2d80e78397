//! TTL input parsing shared by the record wizards

/// TTL value the provider treats as "automatic"
pub const AUTOMATIC_TTL: u32 = 1;

/// How a wizard treats TTL input that is not a positive integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlPolicy {
    /// Substitute [`AUTOMATIC_TTL`] (add-record)
    DefaultToAutomatic,
    /// Reject and re-prompt (edit-field)
    Reject,
}

/// Parse operator TTL input under `policy`
///
/// Accepts ASCII digits only (after trimming) forming a value in `1..=u32::MAX`.
pub fn parse_ttl(input: &str, policy: TtlPolicy) -> Result<u32, String> {
    let trimmed = input.trim();
    let parsed = if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        trimmed.parse::<u32>().ok().filter(|ttl| *ttl > 0)
    } else {
        None
    };

    match (parsed, policy) {
        (Some(ttl), _) => Ok(ttl),
        (None, TtlPolicy::DefaultToAutomatic) => Ok(AUTOMATIC_TTL),
        (None, TtlPolicy::Reject) => {
            Err("TTL must be a positive number. Send it again.".to_string())
        }
    }
}
