use crate::model::BytecodeKind;

/// Errors produced by the reflection entry points.
///
/// Per-element problems (an input with no vertex-format equivalent, an
/// unclassifiable resource) never surface here; those elements are skipped
/// with a warning diagnostic. An `Err` means no usable reflection result
/// exists for the blob.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReflectError {
    /// The blob failed a structural precondition or the container/module
    /// parser rejected it.
    #[error("malformed {kind} blob: {detail}")]
    MalformedContainer {
        /// Which bytecode format was being parsed.
        kind: BytecodeKind,
        /// Human-readable parse context.
        detail: String,
    },

    /// A variable references a type id with no matching declaration in the
    /// module.
    #[error("{kind} module references type id {id} with no declaration")]
    MissingTypeInfo {
        /// Which bytecode format was being parsed.
        kind: BytecodeKind,
        /// The unresolved type id.
        id: u32,
    },
}
