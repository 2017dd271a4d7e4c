use chorda_core::key_group::GroupError;
use chorda_core::layout::LayoutError;
use chorda_core::VirtualKey;
use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CfgError>;

/// A configuration table the device must refuse to start with.
#[derive(Error, Debug, Diagnostic)]
pub enum CfgError {
    #[error("no default layer: the layer table has no entry for the no-key sentinel")]
    #[diagnostic(help("add a sentinel entry holding one row of reaction names per key-order row"))]
    MissingDefaultLayer,

    #[error("layer {layer:?} has {got} rows but the key order has {expected}")]
    #[diagnostic(help("every layer lists exactly one row of reaction names per key-order row"))]
    RowCountMismatch {
        layer: VirtualKey,
        expected: usize,
        got: usize,
    },

    #[error("layer {layer:?}, row {row}: {got} reaction names for {expected} keys")]
    #[diagnostic(help("separate reaction names with whitespace and pad unused cells with ·"))]
    RowLengthMismatch {
        layer: VirtualKey,
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("unknown reaction name `{name}` in layer {layer:?}")]
    #[diagnostic(help(
        "reaction names are printable characters, named keys such as Space or F3, \
         MouseLeft/MouseRight, MouseWheelUp/MouseWheelDown, Log, or a reserved macro name"
    ))]
    UnknownReaction { name: String, layer: VirtualKey },

    #[error("unknown modifier name `{0}`")]
    #[diagnostic(help("modifiers are LShift, LCtrl, LAlt, LGui and their right-hand variants"))]
    UnknownModifier(String),

    #[error("virtual key {0:?} is listed both as a modifier and as a layer key")]
    ConflictingRole(VirtualKey),

    #[error("invalid key group: {0}")]
    Group(#[from] GroupError),

    #[error("invalid keyboard: {0}")]
    Layout(#[from] LayoutError),
}
