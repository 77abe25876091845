//! Math-mode classification for environments and macros.
//!
//! These are pure lookups. The state machine combines them with the current
//! mode to decide what an opening delimiter does and whether it is an error.

use crate::delimiters::DelimiterId;
use once_cell::sync::Lazy;
use regex::Regex;

/// The math mode in effect for a delimiter's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathMode {
    /// Definitely text mode.
    Outside,
    /// Inside the argument of a macro whose semantics are unknown. Math
    /// diagnostics are not reported here.
    Unknown,
    /// Math mode, opened by the referenced delimiter.
    Inside(DelimiterId),
}

impl MathMode {
    pub fn is_inside(self) -> bool {
        matches!(self, MathMode::Inside(_))
    }

    pub fn is_outside(self) -> bool {
        self == MathMode::Outside
    }

    /// The delimiter that opened math mode, if any.
    pub fn opener(self) -> Option<DelimiterId> {
        match self {
            MathMode::Inside(id) => Some(id),
            _ => None,
        }
    }
}

/// How the next `{` group should set its math mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupHint {
    /// Take the mode of the enclosing frame.
    #[default]
    Inherit,
    /// Argument of a text-box macro such as `\hbox` or `\text`.
    Text,
    /// Argument of an unrecognised macro.
    Unknown,
}

/// What an environment does to math mode when it begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentClass {
    /// `document`, `figure`, `theorem`... must not appear inside math.
    OutsideOnly,
    /// `array`, `aligned`... only valid inside math.
    MathOnly,
    /// `equation`, `align`... start a new math mode.
    MathStarting,
    Unknown,
}

static OUTSIDE_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(document|figure|center|enumerate|itemize|table|abstract|proof|lemma|theorem|definition|proposition|corollary|remark|notation|thebibliography)$",
    )
    .expect("valid regex")
});

static MATH_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(array|gathered|split|aligned|alignedat)\*?$").expect("valid regex")
});

static MATH_STARTING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(math|displaymath|equation|eqnarray|multline|align|gather|flalign|alignat)\*?$")
        .expect("valid regex")
});

static BEGIN_SHORTCUT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(be|beq|beqa|bea)$").expect("valid regex"));

static END_SHORTCUT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(ee|eeq|eeqn|eeqa|eeqan|eea)$").expect("valid regex"));

const GREEK_LETTERS: &[&str] = &[
    "alpha", "beta", "gamma", "delta", "epsilon", "varepsilon", "zeta", "eta", "theta",
    "vartheta", "iota", "kappa", "lambda", "mu", "nu", "xi", "pi", "varpi", "rho", "varrho",
    "sigma", "varsigma", "tau", "upsilon", "phi", "varphi", "chi", "psi", "omega", "Gamma",
    "Delta", "Theta", "Lambda", "Xi", "Pi", "Sigma", "Upsilon", "Phi", "Psi", "Omega",
];

const SECTIONING: &[&str] = &["chapter", "section", "subsection", "subsubsection"];

/// Macros whose single argument is set in text mode.
const TEXT_BOXES: &[&str] = &[
    "hbox",
    "text",
    "mbox",
    "footnote",
    "intertext",
    "shortintertext",
    "textnormal",
    "reflectbox",
    "textrm",
];

const VERBATIM_ENVIRONMENTS: &[&str] =
    &["verbatim", "boxedverbatim", "lstlisting", "minted", "Verbatim"];

pub fn classify_environment(name: &str) -> EnvironmentClass {
    if OUTSIDE_ONLY.is_match(name) {
        EnvironmentClass::OutsideOnly
    } else if MATH_ONLY.is_match(name) {
        EnvironmentClass::MathOnly
    } else if MATH_STARTING.is_match(name) {
        EnvironmentClass::MathStarting
    } else {
        EnvironmentClass::Unknown
    }
}

pub fn is_verbatim_environment(name: &str) -> bool {
    VERBATIM_ENVIRONMENTS.contains(&name)
}

pub fn is_greek_letter(name: &str) -> bool {
    GREEK_LETTERS.contains(&name)
}

pub fn is_sectioning(name: &str) -> bool {
    SECTIONING.contains(&name)
}

pub fn is_text_box(name: &str) -> bool {
    TEXT_BOXES.contains(&name)
}

/// `\beq`-style shortcuts for `\begin{equation}`.
pub fn is_begin_shortcut(name: &str) -> bool {
    BEGIN_SHORTCUT.is_match(name)
}

/// `\eeq`-style shortcuts for `\end{equation}`.
pub fn is_end_shortcut(name: &str) -> bool {
    END_SHORTCUT.is_match(name)
}

/// An all-lowercase macro name we know nothing about.
pub fn is_plain_macro(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_lowercase())
}

/// Math mode of a `{` group opened with `hint` inside a frame in `current`.
pub fn group_mode(current: MathMode, hint: GroupHint) -> MathMode {
    match hint {
        GroupHint::Inherit => current,
        GroupHint::Text => MathMode::Outside,
        GroupHint::Unknown => MathMode::Unknown,
    }
}
