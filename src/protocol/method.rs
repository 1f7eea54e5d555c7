//! Closed set of request kinds understood by the dispatcher.

use std::fmt;

/// A request kind. Unknown method strings do not parse and are answered
/// with `MethodNotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Session handshake; reports server info and capabilities.
    Initialize,
    /// Liveness check.
    Ping,
    /// Capability listing.
    ToolsList,
    /// Tool invocation.
    ToolsCall,
}

impl Method {
    /// Wire name of the method.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Ping => "ping",
            Self::ToolsList => "tools/list",
            Self::ToolsCall => "tools/call",
        }
    }

    /// Parse a wire method name.
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "initialize" => Some(Self::Initialize),
            "ping" => Some(Self::Ping),
            "tools/list" => Some(Self::ToolsList),
            "tools/call" => Some(Self::ToolsCall),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
