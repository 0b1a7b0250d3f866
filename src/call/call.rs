//! The call graph node value type.
//!
//! A `Call` is identified by its function name and signature only. Two calls
//! with the same identity are the same graph node no matter how many call
//! sites a trace reports for them.

use super::io_functions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Level of detail a call graph is built at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// One node per function
    #[default]
    #[value(name = "func")]
    Function,
    /// One node per source file
    File,
}

/// Interning key of a call: `(function_name, function_signature)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallKey {
    pub function_name: String,
    pub function_signature: String,
}

impl fmt::Display for CallKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.function_signature.is_empty() {
            write!(f, "{}", self.function_name)
        } else {
            write!(f, "{} {}", self.function_name, self.function_signature)
        }
    }
}

/// A function (or file) node of the call graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Call {
    function_name: String,

    /// May be empty (e.g. library functions without a known definition)
    function_signature: String,

    /// Risk tag attached after construction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    is_dangerous: Option<bool>,
}

impl Call {
    pub fn new(function_name: impl Into<String>, function_signature: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            function_signature: function_signature.into(),
            is_dangerous: None,
        }
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn function_signature(&self) -> &str {
        &self.function_signature
    }

    pub fn identity(&self) -> CallKey {
        CallKey {
            function_name: self.function_name.clone(),
            function_signature: self.function_signature.clone(),
        }
    }

    pub fn is_dangerous(&self) -> Option<bool> {
        self.is_dangerous
    }

    pub fn set_dangerous(&mut self, dangerous: bool) {
        self.is_dangerous = Some(dangerous);
    }

    /// True when this call is one of the C library input primitives
    pub fn is_input_function(&self) -> bool {
        io_functions::is_input_function(&self.function_name)
    }

    /// True when this call is one of the C library output primitives
    pub fn is_output_function(&self) -> bool {
        io_functions::is_output_function(&self.function_name)
    }

    /// Re-key this call for the requested granularity.
    ///
    /// At file granularity the node is named after the file in its signature.
    /// Calls without a file keep their function name so library primitives
    /// remain classifiable.
    pub fn at_granularity(&self, granularity: Granularity) -> Call {
        match granularity {
            Granularity::Function => self.clone(),
            Granularity::File if self.function_signature.is_empty() => Call {
                function_name: self.function_name.clone(),
                function_signature: String::new(),
                is_dangerous: self.is_dangerous,
            },
            Granularity::File => Call {
                function_name: self.function_signature.clone(),
                function_signature: String::new(),
                is_dangerous: self.is_dangerous,
            },
        }
    }
}

impl PartialEq for Call {
    fn eq(&self, other: &Self) -> bool {
        self.function_name == other.function_name
            && self.function_signature == other.function_signature
    }
}

impl Eq for Call {}

impl Hash for Call {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.function_name.hash(state);
        self.function_signature.hash(state);
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.function_signature.is_empty() {
            write!(f, "{}", self.function_name)
        } else {
            write!(f, "{} {}", self.function_name, self.function_signature)
        }
    }
}
