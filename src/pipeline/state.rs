/*!
 * File pipeline state machine.
 *
 * Every file moves through
 * `Detected -> Branched -> Converted -> ScriptChecked -> {Translated | NotTranslated}
 * -> ConvertedBack -> Replaced`, or ends in `Skipped`. Unsupported encodings
 * stop in `Unsupported` before reaching `Skipped`. `transition` is a pure
 * table; illegal moves return `None`.
 */

use std::fmt;

use crate::encoding::EncodingName;

/// Routing branch chosen from the detected encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    /// GBK source, converted through a UTF-8 intermediate and back to GBK
    Gbk,
    /// UTF-8 source, written back as GBK
    Utf8,
    /// ISO-8859-9 source, written back as ISO-8859-9
    Iso8859_9,
}

impl Branch {
    /// Branch for a canonical encoding, `None` for anything unsupported
    pub fn for_encoding(encoding: &EncodingName) -> Option<Self> {
        match encoding {
            EncodingName::Gbk => Some(Self::Gbk),
            EncodingName::Utf8 => Some(Self::Utf8),
            EncodingName::Iso8859_9 => Some(Self::Iso8859_9),
            EncodingName::Unsupported(_) | EncodingName::Unknown => None,
        }
    }

    /// Encoding the source is read in
    pub fn source_encoding(self) -> EncodingName {
        match self {
            Self::Gbk => EncodingName::Gbk,
            Self::Utf8 => EncodingName::Utf8,
            Self::Iso8859_9 => EncodingName::Iso8859_9,
        }
    }

    /// Encoding the file is written back in
    pub fn output_encoding(self) -> EncodingName {
        match self {
            Self::Gbk | Self::Utf8 => EncodingName::Gbk,
            Self::Iso8859_9 => EncodingName::Iso8859_9,
        }
    }

    /// Whether the Latin-1/GBK cell repair may run on this branch
    pub fn allows_cell_repair(self) -> bool {
        !matches!(self, Self::Iso8859_9)
    }
}

/// Position of a file in the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    /// Encoding detection is pending
    Detected,
    /// A supported encoding was found
    Branched(Branch),
    /// The encoding cannot be routed
    Unsupported,
    /// Rows are available as UTF-8 text
    Converted(Branch),
    /// The target-script check ran
    ScriptChecked {
        /// Routing branch
        branch: Branch,
        /// Whether translation is needed
        contains_cjk: bool,
    },
    /// Translation pass completed
    Translated(Branch),
    /// No translation was needed
    NotTranslated(Branch),
    /// Output bytes are ready in the canonical encoding
    ConvertedBack(Branch),
    /// The original file was replaced (terminal)
    Replaced,
    /// The file was left untouched (terminal)
    Skipped,
}

impl PipelineState {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Replaced | Self::Skipped)
    }

    /// Branch of the file, once known
    pub fn branch(&self) -> Option<Branch> {
        match self {
            Self::Branched(b)
            | Self::Converted(b)
            | Self::Translated(b)
            | Self::NotTranslated(b)
            | Self::ConvertedBack(b) => Some(*b),
            Self::ScriptChecked { branch, .. } => Some(*branch),
            Self::Detected | Self::Unsupported | Self::Replaced | Self::Skipped => None,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detected => write!(f, "detected"),
            Self::Branched(b) => write!(f, "branched({:?})", b),
            Self::Unsupported => write!(f, "unsupported"),
            Self::Converted(b) => write!(f, "converted({:?})", b),
            Self::ScriptChecked { branch, contains_cjk } => {
                write!(f, "script-checked({:?}, cjk={})", branch, contains_cjk)
            }
            Self::Translated(b) => write!(f, "translated({:?})", b),
            Self::NotTranslated(b) => write!(f, "not-translated({:?})", b),
            Self::ConvertedBack(b) => write!(f, "converted-back({:?})", b),
            Self::Replaced => write!(f, "replaced"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Input driving the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// Whole-file detection produced an encoding
    Classified(EncodingName),
    /// Source decoded into UTF-8 rows
    Converted,
    /// Target-script check finished
    ScriptChecked {
        /// Whether any CJK text was found
        contains_cjk: bool,
    },
    /// Translation pass finished all rows
    TranslationFinished,
    /// Translation was not needed
    TranslationSkipped,
    /// Output encoded in the canonical encoding
    ConvertedBack,
    /// Original replaced by the output
    Replaced,
    /// A stage failed or the run was interrupted; the original stays untouched
    Abandoned,
}

/// Next state for `event` in `state`, `None` when the move is illegal
pub fn transition(state: &PipelineState, event: &PipelineEvent) -> Option<PipelineState> {
    use PipelineEvent as E;
    use PipelineState as S;

    match (state, event) {
        (s, E::Abandoned) if !s.is_terminal() => Some(S::Skipped),

        (S::Detected, E::Classified(encoding)) => Some(match Branch::for_encoding(encoding) {
            Some(branch) => S::Branched(branch),
            None => S::Unsupported,
        }),

        (S::Branched(b), E::Converted) => Some(S::Converted(*b)),

        (S::Converted(b), E::ScriptChecked { contains_cjk }) => Some(S::ScriptChecked {
            branch: *b,
            contains_cjk: *contains_cjk,
        }),

        (
            S::ScriptChecked {
                branch,
                contains_cjk: true,
            },
            E::TranslationFinished,
        ) => Some(S::Translated(*branch)),

        (
            S::ScriptChecked {
                branch,
                contains_cjk: false,
            },
            E::TranslationSkipped,
        ) => Some(S::NotTranslated(*branch)),

        (S::Translated(b) | S::NotTranslated(b), E::ConvertedBack) => Some(S::ConvertedBack(*b)),

        (S::ConvertedBack(_), E::Replaced) => Some(S::Replaced),

        _ => None,
    }
}
