//! The directive table.
//!
//! Every backslash token the interpreter understands lives in one static,
//! ordered table. Lookup takes the first entry whose token is a prefix of
//! the remaining expression, so table order is load-bearing: `\not` must
//! precede `\n`, and `\sin` preceding `\sinh` is harmless only because the
//! math-function handler re-inserts its name as plain text (the trailing
//! `h` renders right after it).

use crate::FontStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FracStyle {
    /// `\frac`, `\over`: stacked with a separator line.
    Normal,
    Over,
    /// `\atop`: stacked, no line.
    Atop,
    /// `\choose`: stacked, no line (parenthesizing unimplemented).
    Choose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayStyle {
    /// `\not`: reserved slash overlay, currently renders the operand bare.
    Slash,
    /// `\Not`, `\widenot`: corner-to-corner diagonal line.
    DiagLine,
    /// `\sout`, `\strikeout`: horizontal line through the middle.
    HorLine,
    /// `\compose`: two sub-expressions stacked on a shared baseline.
    Compose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayStyle {
    /// `\array`: `{` `}` delimiters scaled to content height.
    Braced,
    /// `\matrix`: `[` `]` delimiters.
    Bracketed,
    /// `\tabular`: no delimiters.
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BezierOrder {
    Quadratic,
    Cubic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alphabet {
    Cyrillic,
    Greek,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpec {
    /// `\color{hex}`: color read from the first argument.
    Custom,
    /// `\gradient{hex}{hex}`: linear recolor of the sub-expression.
    Gradient,
    /// Named shorthands (`\red` etc.), packed `0xRRGGBB`.
    Named(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Frac(FracStyle),
    Overlay(OverlayStyle),
    Array(ArrayStyle),
    Picture,
    Line,
    Bezier(BezierOrder),
    Raise,
    Rotate,
    Magnify,
    Reflect,
    Eval,
    Today,
    Newline,
    Translit(Alphabet),
    Weight(FontStyle),
    Color(ColorSpec),
    /// Math function names re-inserted as plain text.
    MathFunc(&'static str),
    /// A single Greek codepoint glyph; scripts after it attach to the glyph.
    GreekLetter(u32),
    /// Recognized but unimplemented: the token is consumed, nothing renders.
    Reserved,
}

pub struct DirectiveEntry {
    pub token: &'static str,
    pub kind: DirectiveKind,
}

const fn entry(token: &'static str, kind: DirectiveKind) -> DirectiveEntry {
    DirectiveEntry { token, kind }
}

use ArrayStyle::*;
use BezierOrder::*;
use DirectiveKind::*;
use FracStyle::{Atop, Choose, Normal, Over};
use OverlayStyle::{Compose, DiagLine, HorLine, Slash};

pub static DIRECTIVES: &[DirectiveEntry] = &[
    entry("\\frac", Frac(Normal)),
    entry("\\over", Frac(Over)),
    entry("\\atop", Frac(Atop)),
    entry("\\choose", Frac(Choose)),
    entry("\\not", Overlay(Slash)),
    entry("\\Not", Overlay(DiagLine)),
    entry("\\widenot", Overlay(DiagLine)),
    entry("\\sout", Overlay(HorLine)),
    entry("\\strikeout", Overlay(HorLine)),
    entry("\\compose", Overlay(Compose)),
    entry("\\sqrt", Reserved),
    entry("\\sum", Reserved),
    entry("\\prod", Reserved),
    // Arrays
    entry("\\begin", Reserved),
    entry("\\array", Array(Braced)),
    entry("\\matrix", Array(Bracketed)),
    entry("\\tabular", Array(Plain)),
    entry("\\picture", Picture),
    entry("\\line", Line),
    entry("\\rule", Reserved),
    entry("\\circle", Reserved),
    entry("\\bezier", Bezier(Cubic)),
    entry("\\qbezier", Bezier(Quadratic)),
    entry("\\raisebox", Raise),
    entry("\\rotatebox", Rotate),
    entry("\\magnify", Magnify),
    entry("\\magbox", Magnify),
    entry("\\reflectbox", Reflect),
    entry("\\fbox", Reserved),
    entry("\\boxed", Reserved),
    entry("\\eval", Eval),
    entry("\\evaluate", Eval),
    entry("\\today", Today),
    entry("\\calendar", Reserved),
    // Newlines
    entry("\\n", Newline),
    entry("\\\\", Newline),
    // Arrows
    entry("\\longrightarrow", Reserved),
    entry("\\Longrightarrow", Reserved),
    entry("\\longleftarrow", Reserved),
    entry("\\Longleftarrow", Reserved),
    entry("\\longleftrightarrow", Reserved),
    entry("\\Longleftrightarrow", Reserved),
    entry("\\longuparrow", Reserved),
    entry("\\Longuparrow", Reserved),
    entry("\\longdownarrow", Reserved),
    entry("\\Longdownarrow", Reserved),
    entry("\\longupdownarrow", Reserved),
    entry("\\Longupdownarrow", Reserved),
    // Text
    entry("\\cyr", Translit(Alphabet::Cyrillic)),
    entry("\\greek", Translit(Alphabet::Greek)),
    // Weight
    entry("\\it", Weight(FontStyle::Italic)),
    entry("\\bold", Weight(FontStyle::Bold)),
    entry("\\boldit", Weight(FontStyle::BoldItalic)),
    // Colors
    entry("\\color", Color(ColorSpec::Custom)),
    entry("\\red", Color(ColorSpec::Named(0xff0000))),
    entry("\\green", Color(ColorSpec::Named(0x00ff00))),
    entry("\\blue", Color(ColorSpec::Named(0x0000ff))),
    entry("\\black", Color(ColorSpec::Named(0x000000))),
    entry("\\white", Color(ColorSpec::Named(0xffffff))),
    entry("\\gradient", Color(ColorSpec::Gradient)),
    entry("\\reverse", Reserved),
    entry("\\reversefg", Reserved),
    entry("\\reversebg", Reserved),
    // Font sizes
    entry("\\tiny", Reserved),
    entry("\\scriptsize", Reserved),
    entry("\\footnotesize", Reserved),
    entry("\\small", Reserved),
    entry("\\normalsize", Reserved),
    entry("\\large", Reserved),
    entry("\\Large", Reserved),
    entry("\\LARGE", Reserved),
    entry("\\huge", Reserved),
    entry("\\Huge", Reserved),
    entry("\\HUGE", Reserved),
    // Accents
    entry("\\overbrace", Reserved),
    entry("\\underbrace", Reserved),
    entry("\\overline", Reserved),
    entry("\\underline", Reserved),
    entry("\\vec", Reserved),
    entry("\\widevec", Reserved),
    entry("\\overarrow", Reserved),
    entry("\\overrightarrow", Reserved),
    entry("\\Overrightarrow", Reserved),
    entry("\\overleftarrow", Reserved),
    entry("\\Overleftarrow", Reserved),
    entry("\\underarrow", Reserved),
    entry("\\underrightarrow", Reserved),
    entry("\\Underrightarrow", Reserved),
    entry("\\underleftarrow", Reserved),
    entry("\\Underleftarrow", Reserved),
    entry("\\overleftrightarrow", Reserved),
    entry("\\Overleftrightarrow", Reserved),
    entry("\\underleftrightarrow", Reserved),
    entry("\\Underleftrightarrow", Reserved),
    entry("\\bar", Reserved),
    entry("\\widebar", Reserved),
    entry("\\hat", Reserved),
    entry("\\widehat", Reserved),
    entry("\\tilde", Reserved),
    entry("\\widetilde", Reserved),
    entry("\\dot", Reserved),
    entry("\\widedot", Reserved),
    entry("\\ddot", Reserved),
    entry("\\wideddot", Reserved),
    // Math functions
    entry("\\arccos", MathFunc("arccos")),
    entry("\\arcsin", MathFunc("arcsin")),
    entry("\\arctan", MathFunc("arctan")),
    entry("\\arg", MathFunc("arg")),
    entry("\\cos", MathFunc("cos")),
    entry("\\cosh", MathFunc("cosh")),
    entry("\\sin", MathFunc("sin")),
    entry("\\sinh", MathFunc("sinh")),
    entry("\\tan", MathFunc("tan")),
    entry("\\tanh", MathFunc("tanh")),
    entry("\\cot", MathFunc("cot")),
    entry("\\coth", MathFunc("coth")),
    entry("\\csc", MathFunc("csc")),
    entry("\\deg", MathFunc("deg")),
    entry("\\det", MathFunc("det")),
    entry("\\dim", MathFunc("dim")),
    entry("\\exp", MathFunc("exp")),
    entry("\\gcd", MathFunc("gcd")),
    entry("\\hom", MathFunc("hom")),
    entry("\\inf", MathFunc("inf")),
    entry("\\ker", MathFunc("ker")),
    entry("\\lg", MathFunc("lg")),
    entry("\\lim", MathFunc("lim")),
    entry("\\liminf", MathFunc("liminf")),
    entry("\\limsup", MathFunc("limsup")),
    entry("\\ln", MathFunc("ln")),
    entry("\\log", MathFunc("log")),
    entry("\\max", MathFunc("max")),
    entry("\\min", MathFunc("min")),
    entry("\\Pr", MathFunc("Pr")),
    entry("\\sec", MathFunc("sec")),
    entry("\\{", Reserved),
    entry("\\}", Reserved),
    // Greek characters
    entry("\\Alpha", GreekLetter(913)),
    entry("\\Beta", GreekLetter(914)),
    entry("\\Gamma", GreekLetter(915)),
    entry("\\Delta", GreekLetter(916)),
    entry("\\Epsilon", GreekLetter(917)),
    entry("\\Zeta", GreekLetter(918)),
    entry("\\Eta", GreekLetter(919)),
    entry("\\Theta", GreekLetter(920)),
    entry("\\Iota", GreekLetter(921)),
    entry("\\Kappa", GreekLetter(922)),
    entry("\\Lambda", GreekLetter(923)),
    entry("\\Mu", GreekLetter(924)),
    entry("\\Nu", GreekLetter(925)),
    entry("\\Xi", GreekLetter(926)),
    entry("\\Omicron", GreekLetter(927)),
    entry("\\Pi", GreekLetter(928)),
    entry("\\Rho", GreekLetter(929)),
    entry("\\Sigma", GreekLetter(930)),
    entry("\\Tau", GreekLetter(931)),
    entry("\\Upsilon", GreekLetter(932)),
    entry("\\Phi", GreekLetter(933)),
    entry("\\Chi", GreekLetter(934)),
    entry("\\Psi", GreekLetter(935)),
    entry("\\Omega", GreekLetter(936)),
    entry("\\alpha", GreekLetter(945)),
    entry("\\beta", GreekLetter(946)),
    entry("\\gamma", GreekLetter(947)),
    entry("\\delta", GreekLetter(948)),
    entry("\\epsilon", GreekLetter(949)),
    entry("\\zeta", GreekLetter(950)),
    entry("\\eta", GreekLetter(951)),
    entry("\\theta", GreekLetter(952)),
    entry("\\iota", GreekLetter(953)),
    entry("\\kappa", GreekLetter(954)),
    entry("\\lambda", GreekLetter(955)),
    entry("\\mu", GreekLetter(956)),
    entry("\\nu", GreekLetter(957)),
    entry("\\xi", GreekLetter(958)),
    entry("\\omicron", GreekLetter(959)),
    entry("\\pi", GreekLetter(960)),
    entry("\\rho", GreekLetter(961)),
    entry("\\sigma", GreekLetter(963)),
    entry("\\tau", GreekLetter(964)),
    entry("\\upsilon", GreekLetter(965)),
    entry("\\phi", GreekLetter(966)),
    entry("\\chi", GreekLetter(967)),
    entry("\\psi", GreekLetter(968)),
    entry("\\omega", GreekLetter(969)),
];

/// First table entry whose token prefixes `expr`.
pub fn lookup(expr: &str) -> Option<&'static DirectiveEntry> {
    DIRECTIVES.iter().find(|e| expr.starts_with(e.token))
}

/// Latin-transliteration table for `\cyr{...}`.
pub static CYRILLIC: &[(&str, u32)] = &[
    ("A", 1040),
    ("B", 1041),
    ("V", 1042),
    ("D", 1043),
    ("E", 1044),
    ("YO", 1025),
    ("ZH", 1046),
    ("Z", 1047),
    ("I", 1048),
    ("J", 1049),
    ("K", 1050),
    ("L", 1051),
    ("M", 1052),
    ("N", 1053),
    ("O", 1054),
    ("P", 1055),
    ("R", 1056),
    ("S", 1057),
    ("T", 1058),
    ("U", 1059),
    ("F", 1060),
    ("KH", 1061),
    ("TS", 1062),
    ("CH", 1063),
    ("SH", 1064),
    ("SHCH", 1065),
    ("\\Cdprime", 1066),
    ("Y", 1067),
    ("\\Yeta", 1067),
    ("\\Cprime", 1068),
    ("`E", 1069),
    ("YU", 1070),
    ("YA", 1071),
    ("a", 1072),
    ("b", 1073),
    ("v", 1074),
    ("g", 1075),
    ("d", 1076),
    ("e", 1077),
    ("yo", 1105),
    ("zh", 1078),
    ("z", 1079),
    ("i", 1080),
    ("j", 1081),
    ("k", 1082),
    ("l", 1083),
    ("m", 1084),
    ("n", 1085),
    ("o", 1086),
    ("p", 1087),
    ("r", 1088),
    ("s", 1089),
    ("t", 1090),
    ("u", 1091),
    ("f", 1092),
    ("kh", 1093),
    ("ts", 1094),
    ("ch", 1095),
    ("sh", 1096),
    ("shch", 1097),
    ("\\cdprime", 1098),
    ("y", 1099),
    ("\\yeta", 1099),
    ("\\cprime", 1100),
    ("`e", 1101),
    ("yu", 1102),
    ("ya", 1103),
];

/// Latin-transliteration table for `\greek{...}`.
pub static GREEK: &[(&str, u32)] = &[
    ("A", 913),
    ("B", 914),
    ("G", 915),
    ("D", 916),
    ("E", 917),
    ("Z", 918),
    ("H", 919),
    ("Q", 920),
    ("I", 921),
    ("K", 922),
    ("L", 923),
    ("M", 924),
    ("N", 925),
    ("C", 926),
    ("O", 927),
    ("P", 928),
    ("R", 929),
    ("S", 930),
    ("T", 931),
    ("U", 932),
    ("F", 933),
    ("X", 934),
    ("Y", 935),
    ("W", 936),
    ("a", 945),
    ("b", 946),
    ("g", 947),
    ("d", 948),
    ("e", 949),
    ("z", 950),
    ("h", 951),
    ("q", 952),
    ("i", 953),
    ("k", 954),
    ("l", 955),
    ("m", 956),
    ("n", 957),
    ("c", 958),
    ("o", 959),
    ("p", 960),
    ("r", 961),
    ("s", 963),
    ("t", 964),
    ("u", 965),
    ("f", 966),
    ("x", 967),
    ("y", 968),
    ("w", 969),
];

/// Longest-wins transliteration lookup: the last table entry that prefixes
/// `expr` takes priority, so digraphs like `shch` beat `sh` beat `s`.
pub(crate) fn find_letter(
    table: &[(&'static str, u32)],
    expr: &str,
) -> Option<(&'static str, u32)> {
    let mut found = None;
    for &(seq, code) in table {
        if expr.starts_with(seq) {
            found = Some((seq, code));
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_first_match_in_table_order() {
        assert_eq!(lookup("\\frac{1}{2}").map(|e| e.token), Some("\\frac"));
        // \not precedes \n in the table.
        assert_eq!(lookup("\\not{=}").map(|e| e.token), Some("\\not"));
        assert_eq!(lookup("\\nothing").map(|e| e.token), Some("\\not"));
        // \n precedes \nu: the Greek letter token is shadowed.
        assert_eq!(lookup("\\nu").map(|e| e.token), Some("\\n"));
        // \sin matches before \sinh; the handler re-inserts "sin" and the
        // trailing h renders as an ordinary glyph.
        assert_eq!(lookup("\\sinh(x)").map(|e| e.token), Some("\\sin"));
        assert!(lookup("\\qwerty").is_none());
    }

    #[test]
    fn reserved_tokens_resolve() {
        assert!(matches!(
            lookup("\\sqrt{2}").map(|e| e.kind),
            Some(DirectiveKind::Reserved)
        ));
        assert!(matches!(
            lookup("\\Longleftrightarrow").map(|e| e.kind),
            Some(DirectiveKind::Reserved)
        ));
    }

    #[test]
    fn named_colors() {
        assert_eq!(
            lookup("\\red{a}").map(|e| e.kind),
            Some(DirectiveKind::Color(ColorSpec::Named(0xff0000)))
        );
    }

    #[test]
    fn translit_longest_sequence_wins() {
        assert_eq!(find_letter(CYRILLIC, "shch"), Some(("shch", 1097)));
        assert_eq!(find_letter(CYRILLIC, "sh"), Some(("sh", 1096)));
        assert_eq!(find_letter(CYRILLIC, "s"), Some(("s", 1089)));
        assert_eq!(find_letter(CYRILLIC, "\\cprime x"), Some(("\\cprime", 1100)));
        assert_eq!(find_letter(GREEK, "w"), Some(("w", 969)));
        assert_eq!(find_letter(GREEK, "7"), None);
    }
}
