//! Structural parser for the failover daemon's config file.
//!
//! Extracts a flat descriptor from the first `vrrp_instance` block of a
//! keepalived-style config. Only the subset of the grammar the agent needs
//! is recognized; everything else is ignored.

use crate::types::Role;
use common::{Error, Result};
use std::path::Path;

/// Static failover configuration extracted from the daemon's config file.
///
/// Built once at startup and immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VrrpDescriptor {
    pub role: Role,
    pub interface: Option<String>,
    pub router_id: Option<String>,
    pub priority: Option<String>,
    pub virtual_ips: Vec<String>,
}

impl Default for VrrpDescriptor {
    fn default() -> Self {
        Self {
            role: Role::Unknown,
            interface: None,
            router_id: None,
            priority: None,
            virtual_ips: Vec::new(),
        }
    }
}

impl VrrpDescriptor {
    /// Interface to probe, falling back to the conventional default when
    /// the config names none.
    pub fn interface_or_default(&self) -> &str {
        self.interface
            .as_deref()
            .unwrap_or(crate::types::DEFAULT_INTERFACE)
    }

    /// First configured virtual IP, or a safe placeholder when the VIP
    /// block is empty or absent.
    pub fn primary_vip(&self) -> &str {
        self.virtual_ips
            .first()
            .map(String::as_str)
            .unwrap_or(crate::types::PLACEHOLDER_VIP)
    }
}

/// Parser states for the instance block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockState {
    /// Before the first `vrrp_instance` line.
    Idle,
    /// Inside the instance block, outside the VIP sub-block.
    Instance,
    /// Inside the `virtual_ipaddress { ... }` sub-block.
    VipList,
    /// First instance block fully closed; everything after is ignored.
    Done,
}

/// Parse a config file from disk.
///
/// A missing or unreadable file is a fatal configuration failure; the
/// returned error must abort startup.
pub fn parse_file(path: impl AsRef<Path>) -> Result<VrrpDescriptor> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::parse(format!("{}: {}", path.display(), e)))?;
    Ok(parse_str(&contents))
}

/// Parse config text.
///
/// Never fails: malformed input yields a partial descriptor. An unclosed
/// block simply terminates at end of input.
pub fn parse_str(input: &str) -> VrrpDescriptor {
    let mut out = VrrpDescriptor::default();
    let mut state = BlockState::Idle;
    // Brace depth relative to the instance block opener.
    let mut depth: i32 = 0;

    for line in input.lines() {
        let stripped = line.trim();

        match state {
            BlockState::Idle => {
                if first_token_is(stripped, "vrrp_instance") {
                    depth = brace_delta(stripped);
                    state = BlockState::Instance;
                }
            }

            BlockState::Instance | BlockState::VipList => {
                depth += brace_delta(stripped);
                if depth <= 0 {
                    state = BlockState::Done;
                    continue;
                }

                if state == BlockState::VipList {
                    if stripped.starts_with('}') {
                        state = BlockState::Instance;
                    } else if !stripped.is_empty() && !stripped.starts_with('#') {
                        out.virtual_ips.push(stripped.to_string());
                    }
                    continue;
                }

                if first_token_is(stripped, "virtual_ipaddress") {
                    state = BlockState::VipList;
                    continue;
                }

                if let Some(value) = keyword_value(stripped, "state") {
                    out.role = Role::from_config_token(value);
                } else if let Some(value) = keyword_value(stripped, "interface") {
                    out.interface = Some(value.to_string());
                } else if let Some(value) = keyword_value(stripped, "virtual_router_id") {
                    out.router_id = Some(value.to_string());
                } else if let Some(value) = keyword_value(stripped, "priority") {
                    out.priority = Some(value.to_string());
                }
            }

            // First match wins: later instance blocks are ignored.
            BlockState::Done => {}
        }
    }

    out
}

/// Net brace count of a line.
fn brace_delta(line: &str) -> i32 {
    let opens = line.matches('{').count() as i32;
    let closes = line.matches('}').count() as i32;
    opens - closes
}

/// Case-insensitive match of the first whitespace-separated token.
fn first_token_is(line: &str, keyword: &str) -> bool {
    line.split_whitespace()
        .next()
        .is_some_and(|t| t.eq_ignore_ascii_case(keyword))
}

/// Second token of a keyword line, if the first token matches.
fn keyword_value<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    if first_token_is(line, keyword) {
        line.split_whitespace().nth(1)
    } else {
        None
    }
}
