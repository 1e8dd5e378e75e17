//! Line codec for the durable state file: one `name:state` record per line.
//!
//! The separator is the *last* colon on the line, because systemd unit names
//! may themselves contain colons while the four state spellings never do.

use crate::monitor::probe::ServiceState;

/// Render one record. The result never contains a newline.
#[must_use]
pub fn render_line(service: &str, state: ServiceState) -> String {
    format!("{service}:{}", state.as_str())
}

/// Parse one record. Returns `None` for blank, comment-like, or otherwise
/// unreadable lines; callers tolerate and count these rather than failing.
#[must_use]
pub fn parse_line(line: &str) -> Option<(&str, ServiceState)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (service, state) = line.rsplit_once(':')?;
    if service.is_empty() {
        return None;
    }
    state.parse().ok().map(|state| (service, state))
}
