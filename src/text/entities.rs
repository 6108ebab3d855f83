//! Character to HTML entity-name lookup.
//!
//! The table is built once on first use and read-only afterwards. Names are
//! stored without the surrounding `&`/`;`.

use ahash::AHashMap;
use std::sync::OnceLock;

static CHAR_TO_ENTITY: OnceLock<AHashMap<char, &'static str>> = OnceLock::new();

/// Named entity for `c`, if one exists (e.g. `'&'` → `"amp"`).
pub fn entity_for(c: char) -> Option<&'static str> {
    CHAR_TO_ENTITY
        .get_or_init(|| ENTITIES.iter().copied().collect())
        .get(&c)
        .copied()
}

/// HTML 4 named entities: markup characters, the Latin-1 block, and the
/// common typographic range.
const ENTITIES: &[(char, &str)] = &[
    ('&', "amp"),
    ('<', "lt"),
    ('>', "gt"),
    ('"', "quot"),
    ('\'', "apos"),
    ('\u{A0}', "nbsp"),
    ('\u{A1}', "iexcl"),
    ('\u{A2}', "cent"),
    ('\u{A3}', "pound"),
    ('\u{A4}', "curren"),
    ('\u{A5}', "yen"),
    ('\u{A6}', "brvbar"),
    ('\u{A7}', "sect"),
    ('\u{A8}', "uml"),
    ('\u{A9}', "copy"),
    ('\u{AA}', "ordf"),
    ('\u{AB}', "laquo"),
    ('\u{AC}', "not"),
    ('\u{AD}', "shy"),
    ('\u{AE}', "reg"),
    ('\u{AF}', "macr"),
    ('\u{B0}', "deg"),
    ('\u{B1}', "plusmn"),
    ('\u{B2}', "sup2"),
    ('\u{B3}', "sup3"),
    ('\u{B4}', "acute"),
    ('\u{B5}', "micro"),
    ('\u{B6}', "para"),
    ('\u{B7}', "middot"),
    ('\u{B8}', "cedil"),
    ('\u{B9}', "sup1"),
    ('\u{BA}', "ordm"),
    ('\u{BB}', "raquo"),
    ('\u{BC}', "frac14"),
    ('\u{BD}', "frac12"),
    ('\u{BE}', "frac34"),
    ('\u{BF}', "iquest"),
    ('\u{C0}', "Agrave"),
    ('\u{C1}', "Aacute"),
    ('\u{C2}', "Acirc"),
    ('\u{C3}', "Atilde"),
    ('\u{C4}', "Auml"),
    ('\u{C5}', "Aring"),
    ('\u{C6}', "AElig"),
    ('\u{C7}', "Ccedil"),
    ('\u{C8}', "Egrave"),
    ('\u{C9}', "Eacute"),
    ('\u{CA}', "Ecirc"),
    ('\u{CB}', "Euml"),
    ('\u{CC}', "Igrave"),
    ('\u{CD}', "Iacute"),
    ('\u{CE}', "Icirc"),
    ('\u{CF}', "Iuml"),
    ('\u{D0}', "ETH"),
    ('\u{D1}', "Ntilde"),
    ('\u{D2}', "Ograve"),
    ('\u{D3}', "Oacute"),
    ('\u{D4}', "Ocirc"),
    ('\u{D5}', "Otilde"),
    ('\u{D6}', "Ouml"),
    ('\u{D7}', "times"),
    ('\u{D8}', "Oslash"),
    ('\u{D9}', "Ugrave"),
    ('\u{DA}', "Uacute"),
    ('\u{DB}', "Ucirc"),
    ('\u{DC}', "Uuml"),
    ('\u{DD}', "Yacute"),
    ('\u{DE}', "THORN"),
    ('\u{DF}', "szlig"),
    ('\u{E0}', "agrave"),
    ('\u{E1}', "aacute"),
    ('\u{E2}', "acirc"),
    ('\u{E3}', "atilde"),
    ('\u{E4}', "auml"),
    ('\u{E5}', "aring"),
    ('\u{E6}', "aelig"),
    ('\u{E7}', "ccedil"),
    ('\u{E8}', "egrave"),
    ('\u{E9}', "eacute"),
    ('\u{EA}', "ecirc"),
    ('\u{EB}', "euml"),
    ('\u{EC}', "igrave"),
    ('\u{ED}', "iacute"),
    ('\u{EE}', "icirc"),
    ('\u{EF}', "iuml"),
    ('\u{F0}', "eth"),
    ('\u{F1}', "ntilde"),
    ('\u{F2}', "ograve"),
    ('\u{F3}', "oacute"),
    ('\u{F4}', "ocirc"),
    ('\u{F5}', "otilde"),
    ('\u{F6}', "ouml"),
    ('\u{F7}', "divide"),
    ('\u{F8}', "oslash"),
    ('\u{F9}', "ugrave"),
    ('\u{FA}', "uacute"),
    ('\u{FB}', "ucirc"),
    ('\u{FC}', "uuml"),
    ('\u{FD}', "yacute"),
    ('\u{FE}', "thorn"),
    ('\u{FF}', "yuml"),
    ('\u{152}', "OElig"),
    ('\u{153}', "oelig"),
    ('\u{160}', "Scaron"),
    ('\u{161}', "scaron"),
    ('\u{178}', "Yuml"),
    ('\u{192}', "fnof"),
    ('\u{2C6}', "circ"),
    ('\u{2DC}', "tilde"),
    ('\u{2013}', "ndash"),
    ('\u{2014}', "mdash"),
    ('\u{2018}', "lsquo"),
    ('\u{2019}', "rsquo"),
    ('\u{201A}', "sbquo"),
    ('\u{201C}', "ldquo"),
    ('\u{201D}', "rdquo"),
    ('\u{201E}', "bdquo"),
    ('\u{2020}', "dagger"),
    ('\u{2021}', "Dagger"),
    ('\u{2022}', "bull"),
    ('\u{2026}', "hellip"),
    ('\u{2030}', "permil"),
    ('\u{2039}', "lsaquo"),
    ('\u{203A}', "rsaquo"),
    ('\u{20AC}', "euro"),
    ('\u{2122}', "trade"),
];
