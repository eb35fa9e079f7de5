//! Named character references.
//!
//! A curated subset of the HTML named-reference table: the Latin-1 set
//! (both `;`-terminated and legacy bare forms), the ASCII markup escapes,
//! and the common punctuation/symbol/Greek names. Resolution uses
//! longest-match-wins over this table.
//!
//! Contract:
//! - Names are matched case-sensitively, without the leading `&`.
//! - Legacy (semicolon-less) forms exist only for names that had them in
//!   legacy HTML; `not` is deliberately absent in bare form (only `not;`
//!   resolves), so text like `&notafragment` passes through verbatim.
//! - Unknown names never resolve; the tokenizer reports them and leaves the
//!   input unchanged.

/// (name, replacement) pairs; names exclude the leading `&`.
static NAMED_REFERENCES: &[(&str, &str)] = &[
    ("AElig;", "\u{C6}"), ("AElig", "\u{C6}"),
    ("AMP;", "&"), ("AMP", "&"),
    ("Aacute;", "\u{C1}"), ("Aacute", "\u{C1}"),
    ("Acirc;", "\u{C2}"), ("Acirc", "\u{C2}"),
    ("Agrave;", "\u{C0}"), ("Agrave", "\u{C0}"),
    ("Alpha;", "\u{391}"),
    ("Aring;", "\u{C5}"), ("Aring", "\u{C5}"),
    ("Atilde;", "\u{C3}"), ("Atilde", "\u{C3}"),
    ("Auml;", "\u{C4}"), ("Auml", "\u{C4}"),
    ("Beta;", "\u{392}"),
    ("COPY;", "\u{A9}"), ("COPY", "\u{A9}"),
    ("Ccedil;", "\u{C7}"), ("Ccedil", "\u{C7}"),
    ("Dagger;", "\u{2021}"),
    ("Delta;", "\u{394}"),
    ("ETH;", "\u{D0}"), ("ETH", "\u{D0}"),
    ("Eacute;", "\u{C9}"), ("Eacute", "\u{C9}"),
    ("Ecirc;", "\u{CA}"), ("Ecirc", "\u{CA}"),
    ("Egrave;", "\u{C8}"), ("Egrave", "\u{C8}"),
    ("Epsilon;", "\u{395}"),
    ("Euml;", "\u{CB}"), ("Euml", "\u{CB}"),
    ("GT;", ">"), ("GT", ">"),
    ("Gamma;", "\u{393}"),
    ("Iacute;", "\u{CD}"), ("Iacute", "\u{CD}"),
    ("Icirc;", "\u{CE}"), ("Icirc", "\u{CE}"),
    ("Igrave;", "\u{CC}"), ("Igrave", "\u{CC}"),
    ("Iuml;", "\u{CF}"), ("Iuml", "\u{CF}"),
    ("LT;", "<"), ("LT", "<"),
    ("Lambda;", "\u{39B}"),
    ("Ntilde;", "\u{D1}"), ("Ntilde", "\u{D1}"),
    ("Oacute;", "\u{D3}"), ("Oacute", "\u{D3}"),
    ("Ocirc;", "\u{D4}"), ("Ocirc", "\u{D4}"),
    ("Ograve;", "\u{D2}"), ("Ograve", "\u{D2}"),
    ("Omega;", "\u{3A9}"),
    ("Oslash;", "\u{D8}"), ("Oslash", "\u{D8}"),
    ("Otilde;", "\u{D5}"), ("Otilde", "\u{D5}"),
    ("Ouml;", "\u{D6}"), ("Ouml", "\u{D6}"),
    ("Phi;", "\u{3A6}"),
    ("Pi;", "\u{3A0}"),
    ("Prime;", "\u{2033}"),
    ("Psi;", "\u{3A8}"),
    ("QUOT;", "\""), ("QUOT", "\""),
    ("REG;", "\u{AE}"), ("REG", "\u{AE}"),
    ("Sigma;", "\u{3A3}"),
    ("THORN;", "\u{DE}"), ("THORN", "\u{DE}"),
    ("Theta;", "\u{398}"),
    ("Uacute;", "\u{DA}"), ("Uacute", "\u{DA}"),
    ("Ucirc;", "\u{DB}"), ("Ucirc", "\u{DB}"),
    ("Ugrave;", "\u{D9}"), ("Ugrave", "\u{D9}"),
    ("Uuml;", "\u{DC}"), ("Uuml", "\u{DC}"),
    ("Xi;", "\u{39E}"),
    ("Yacute;", "\u{DD}"), ("Yacute", "\u{DD}"),
    ("aacute;", "\u{E1}"), ("aacute", "\u{E1}"),
    ("acirc;", "\u{E2}"), ("acirc", "\u{E2}"),
    ("acute;", "\u{B4}"), ("acute", "\u{B4}"),
    ("aelig;", "\u{E6}"), ("aelig", "\u{E6}"),
    ("agrave;", "\u{E0}"), ("agrave", "\u{E0}"),
    ("alpha;", "\u{3B1}"),
    ("amp;", "&"), ("amp", "&"),
    ("apos;", "'"),
    ("aring;", "\u{E5}"), ("aring", "\u{E5}"),
    ("asymp;", "\u{2248}"),
    ("atilde;", "\u{E3}"), ("atilde", "\u{E3}"),
    ("auml;", "\u{E4}"), ("auml", "\u{E4}"),
    ("bdquo;", "\u{201E}"),
    ("beta;", "\u{3B2}"),
    ("brvbar;", "\u{A6}"), ("brvbar", "\u{A6}"),
    ("bull;", "\u{2022}"),
    ("cap;", "\u{2229}"),
    ("ccedil;", "\u{E7}"), ("ccedil", "\u{E7}"),
    ("cedil;", "\u{B8}"), ("cedil", "\u{B8}"),
    ("cent;", "\u{A2}"), ("cent", "\u{A2}"),
    ("chi;", "\u{3C7}"),
    ("cong;", "\u{2245}"),
    ("copy;", "\u{A9}"), ("copy", "\u{A9}"),
    ("cup;", "\u{222A}"),
    ("curren;", "\u{A4}"), ("curren", "\u{A4}"),
    ("dagger;", "\u{2020}"),
    ("darr;", "\u{2193}"),
    ("deg;", "\u{B0}"), ("deg", "\u{B0}"),
    ("delta;", "\u{3B4}"),
    ("divide;", "\u{F7}"), ("divide", "\u{F7}"),
    ("eacute;", "\u{E9}"), ("eacute", "\u{E9}"),
    ("ecirc;", "\u{EA}"), ("ecirc", "\u{EA}"),
    ("egrave;", "\u{E8}"), ("egrave", "\u{E8}"),
    ("empty;", "\u{2205}"),
    ("emsp;", "\u{2003}"),
    ("ensp;", "\u{2002}"),
    ("epsilon;", "\u{3B5}"),
    ("equiv;", "\u{2261}"),
    ("eta;", "\u{3B7}"),
    ("eth;", "\u{F0}"), ("eth", "\u{F0}"),
    ("euml;", "\u{EB}"), ("euml", "\u{EB}"),
    ("euro;", "\u{20AC}"),
    ("exist;", "\u{2203}"),
    ("forall;", "\u{2200}"),
    ("frac12;", "\u{BD}"), ("frac12", "\u{BD}"),
    ("frac14;", "\u{BC}"), ("frac14", "\u{BC}"),
    ("frac34;", "\u{BE}"), ("frac34", "\u{BE}"),
    ("gamma;", "\u{3B3}"),
    ("ge;", "\u{2265}"),
    ("gt;", ">"), ("gt", ">"),
    ("harr;", "\u{2194}"),
    ("hellip;", "\u{2026}"),
    ("iacute;", "\u{ED}"), ("iacute", "\u{ED}"),
    ("icirc;", "\u{EE}"), ("icirc", "\u{EE}"),
    ("iexcl;", "\u{A1}"), ("iexcl", "\u{A1}"),
    ("igrave;", "\u{EC}"), ("igrave", "\u{EC}"),
    ("infin;", "\u{221E}"),
    ("int;", "\u{222B}"),
    ("iota;", "\u{3B9}"),
    ("iquest;", "\u{BF}"), ("iquest", "\u{BF}"),
    ("isin;", "\u{2208}"),
    ("iuml;", "\u{EF}"), ("iuml", "\u{EF}"),
    ("kappa;", "\u{3BA}"),
    ("lambda;", "\u{3BB}"),
    ("lang;", "\u{27E8}"),
    ("laquo;", "\u{AB}"), ("laquo", "\u{AB}"),
    ("larr;", "\u{2190}"),
    ("lceil;", "\u{2308}"),
    ("ldquo;", "\u{201C}"),
    ("le;", "\u{2264}"),
    ("lfloor;", "\u{230A}"),
    ("loz;", "\u{25CA}"),
    ("lrm;", "\u{200E}"),
    ("lsaquo;", "\u{2039}"),
    ("lsquo;", "\u{2018}"),
    ("lt;", "<"), ("lt", "<"),
    ("macr;", "\u{AF}"), ("macr", "\u{AF}"),
    ("mdash;", "\u{2014}"),
    ("micro;", "\u{B5}"), ("micro", "\u{B5}"),
    ("middot;", "\u{B7}"), ("middot", "\u{B7}"),
    ("minus;", "\u{2212}"),
    ("mu;", "\u{3BC}"),
    ("nabla;", "\u{2207}"),
    ("nbsp;", "\u{A0}"), ("nbsp", "\u{A0}"),
    ("ndash;", "\u{2013}"),
    ("ne;", "\u{2260}"),
    ("ni;", "\u{220B}"),
    ("not;", "\u{AC}"),
    ("notin;", "\u{2209}"),
    ("ntilde;", "\u{F1}"), ("ntilde", "\u{F1}"),
    ("nu;", "\u{3BD}"),
    ("oacute;", "\u{F3}"), ("oacute", "\u{F3}"),
    ("ocirc;", "\u{F4}"), ("ocirc", "\u{F4}"),
    ("ograve;", "\u{F2}"), ("ograve", "\u{F2}"),
    ("oline;", "\u{203E}"),
    ("omega;", "\u{3C9}"),
    ("oplus;", "\u{2295}"),
    ("ordf;", "\u{AA}"), ("ordf", "\u{AA}"),
    ("ordm;", "\u{BA}"), ("ordm", "\u{BA}"),
    ("oslash;", "\u{F8}"), ("oslash", "\u{F8}"),
    ("otilde;", "\u{F5}"), ("otilde", "\u{F5}"),
    ("otimes;", "\u{2297}"),
    ("ouml;", "\u{F6}"), ("ouml", "\u{F6}"),
    ("para;", "\u{B6}"), ("para", "\u{B6}"),
    ("part;", "\u{2202}"),
    ("permil;", "\u{2030}"),
    ("perp;", "\u{22A5}"),
    ("phi;", "\u{3C6}"),
    ("pi;", "\u{3C0}"),
    ("plusmn;", "\u{B1}"), ("plusmn", "\u{B1}"),
    ("pound;", "\u{A3}"), ("pound", "\u{A3}"),
    ("prime;", "\u{2032}"),
    ("prod;", "\u{220F}"),
    ("prop;", "\u{221D}"),
    ("psi;", "\u{3C8}"),
    ("quot;", "\""), ("quot", "\""),
    ("radic;", "\u{221A}"),
    ("rang;", "\u{27E9}"),
    ("raquo;", "\u{BB}"), ("raquo", "\u{BB}"),
    ("rarr;", "\u{2192}"),
    ("rceil;", "\u{2309}"),
    ("rdquo;", "\u{201D}"),
    ("reg;", "\u{AE}"), ("reg", "\u{AE}"),
    ("rfloor;", "\u{230B}"),
    ("rho;", "\u{3C1}"),
    ("rlm;", "\u{200F}"),
    ("rsaquo;", "\u{203A}"),
    ("rsquo;", "\u{2019}"),
    ("sbquo;", "\u{201A}"),
    ("sdot;", "\u{22C5}"),
    ("sect;", "\u{A7}"), ("sect", "\u{A7}"),
    ("shy;", "\u{AD}"), ("shy", "\u{AD}"),
    ("sigma;", "\u{3C3}"),
    ("sim;", "\u{223C}"),
    ("sub;", "\u{2282}"),
    ("sube;", "\u{2286}"),
    ("sum;", "\u{2211}"),
    ("sup1;", "\u{B9}"), ("sup1", "\u{B9}"),
    ("sup2;", "\u{B2}"), ("sup2", "\u{B2}"),
    ("sup3;", "\u{B3}"), ("sup3", "\u{B3}"),
    ("sup;", "\u{2283}"),
    ("supe;", "\u{2287}"),
    ("szlig;", "\u{DF}"), ("szlig", "\u{DF}"),
    ("tau;", "\u{3C4}"),
    ("there4;", "\u{2234}"),
    ("theta;", "\u{3B8}"),
    ("thinsp;", "\u{2009}"),
    ("thorn;", "\u{FE}"), ("thorn", "\u{FE}"),
    ("times;", "\u{D7}"), ("times", "\u{D7}"),
    ("trade;", "\u{2122}"),
    ("uacute;", "\u{FA}"), ("uacute", "\u{FA}"),
    ("uarr;", "\u{2191}"),
    ("ucirc;", "\u{FB}"), ("ucirc", "\u{FB}"),
    ("ugrave;", "\u{F9}"), ("ugrave", "\u{F9}"),
    ("uml;", "\u{A8}"), ("uml", "\u{A8}"),
    ("upsilon;", "\u{3C5}"),
    ("uuml;", "\u{FC}"), ("uuml", "\u{FC}"),
    ("xi;", "\u{3BE}"),
    ("yacute;", "\u{FD}"), ("yacute", "\u{FD}"),
    ("yen;", "\u{A5}"), ("yen", "\u{A5}"),
    ("yuml;", "\u{FF}"), ("yuml", "\u{FF}"),
    ("zeta;", "\u{3B6}"),
    ("zwj;", "\u{200D}"),
    ("zwnj;", "\u{200C}"),
];

/// Longest table name that is a prefix of `candidate`, with its
/// replacement. `candidate` must not include the leading `&`.
pub(crate) fn longest_match(candidate: &str) -> Option<(&'static str, &'static str)> {
    let mut best: Option<(&'static str, &'static str)> = None;
    for (name, replacement) in NAMED_REFERENCES {
        let better = match best {
            Some((current, _)) => name.len() > current.len(),
            None => true,
        };
        if better && candidate.starts_with(name) {
            best = Some((name, replacement));
        }
    }
    best
}

/// Longest name length in the table (lookahead bound for the tokenizer).
pub(crate) fn max_name_len() -> usize {
    NAMED_REFERENCES
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .expect("table is non-empty")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_match_wins() {
        assert_eq!(longest_match("amp;x"), Some(("amp;", "&")));
        assert_eq!(longest_match("ampx"), Some(("amp", "&")));
        assert_eq!(longest_match("ltx"), Some(("lt", "<")));
        // `not;` resolves, the bare legacy form is deliberately absent.
        assert_eq!(longest_match("not;x"), Some(("not;", "\u{AC}")));
        assert_eq!(longest_match("notafragment"), None);
        assert_eq!(longest_match("zzz"), None);
    }

    #[test]
    fn legacy_forms_exist_for_the_latin1_set() {
        for name in ["copy", "reg", "nbsp", "eacute", "frac12", "times"] {
            assert!(longest_match(name).is_some(), "{name} must have a bare form");
        }
        for name in ["mdash", "hellip", "euro"] {
            assert_eq!(longest_match(name), None, "{name} requires the semicolon");
        }
    }
}
