//! Compatibility-mode determination from the doctype token.

use dom::CompatMode;

use crate::token::DoctypeToken;

/// Public-identifier prefixes that force quirks mode.
static QUIRKY_PUBLIC_PREFIXES: &[&str] = &[
    "+//silmaril//dtd html pro v0r11 19970101//",
    "-//as//dtd html 3.0 aswedit + extensions//",
    "-//advasoft ltd//dtd html 3.0 aswedit + extensions//",
    "-//ietf//dtd html 2.0 level 1//",
    "-//ietf//dtd html 2.0 level 2//",
    "-//ietf//dtd html 2.0 strict level 1//",
    "-//ietf//dtd html 2.0 strict level 2//",
    "-//ietf//dtd html 2.0 strict//",
    "-//ietf//dtd html 2.0//",
    "-//ietf//dtd html 2.1e//",
    "-//ietf//dtd html 3.0//",
    "-//ietf//dtd html 3.2 final//",
    "-//ietf//dtd html 3.2//",
    "-//ietf//dtd html 3//",
    "-//ietf//dtd html level 0//",
    "-//ietf//dtd html level 1//",
    "-//ietf//dtd html level 2//",
    "-//ietf//dtd html level 3//",
    "-//ietf//dtd html strict level 0//",
    "-//ietf//dtd html strict level 1//",
    "-//ietf//dtd html strict level 2//",
    "-//ietf//dtd html strict level 3//",
    "-//ietf//dtd html strict//",
    "-//ietf//dtd html//",
    "-//metrius//dtd metrius presentational//",
    "-//microsoft//dtd internet explorer 2.0 html strict//",
    "-//microsoft//dtd internet explorer 2.0 html//",
    "-//microsoft//dtd internet explorer 2.0 tables//",
    "-//microsoft//dtd internet explorer 3.0 html strict//",
    "-//microsoft//dtd internet explorer 3.0 html//",
    "-//microsoft//dtd internet explorer 3.0 tables//",
    "-//netscape comm. corp.//dtd html//",
    "-//netscape comm. corp.//dtd strict html//",
    "-//o'reilly and associates//dtd html 2.0//",
    "-//o'reilly and associates//dtd html extended 1.0//",
    "-//o'reilly and associates//dtd html extended relaxed 1.0//",
    "-//sq//dtd html 2.0 hotmetal + extensions//",
    "-//softquad software//dtd hotmetal pro 6.0::19990601::extensions to html 4.0//",
    "-//softquad//dtd hotmetal pro 4.0::19971010::extensions to html 4.0//",
    "-//spyglass//dtd html 2.0 extended//",
    "-//sun microsystems corp.//dtd hotjava html//",
    "-//sun microsystems corp.//dtd hotjava strict html//",
    "-//w3c//dtd html 3 1995-03-24//",
    "-//w3c//dtd html 3.2 draft//",
    "-//w3c//dtd html 3.2 final//",
    "-//w3c//dtd html 3.2//",
    "-//w3c//dtd html 3.2s draft//",
    "-//w3c//dtd html 4.0 frameset//",
    "-//w3c//dtd html 4.0 transitional//",
    "-//w3c//dtd html experimental 19960712//",
    "-//w3c//dtd html experimental 970421//",
    "-//w3c//dtd w3 html//",
    "-//w3o//dtd w3 html 3.0//",
    "-//webtechs//dtd mozilla html 2.0//",
    "-//webtechs//dtd mozilla html//",
];

static QUIRKY_PUBLIC_EXACT: &[&str] = &[
    "-//w3o//dtd w3 html strict 3.0//en//",
    "-/w3c/dtd html 4.0 transitional/en",
    "html",
];

const QUIRKY_SYSTEM_EXACT: &str =
    "http://www.ibm.com/data/dtd/v11/ibmxhtml1-transitional.dtd";

static LIMITED_QUIRKS_PUBLIC_PREFIXES: &[&str] = &[
    "-//w3c//dtd xhtml 1.0 frameset//",
    "-//w3c//dtd xhtml 1.0 transitional//",
];

static QUIRKY_WHEN_NO_SYSTEM: &[&str] = &[
    "-//w3c//dtd html 4.01 frameset//",
    "-//w3c//dtd html 4.01 transitional//",
];

/// Map a doctype token to the document compatibility mode.
pub(crate) fn mode_for_doctype(doctype: &DoctypeToken) -> CompatMode {
    if doctype.force_quirks {
        return CompatMode::Quirks;
    }
    if doctype.name.as_deref() != Some("html") {
        return CompatMode::Quirks;
    }
    let public = doctype.public_id.as_deref().map(str::to_ascii_lowercase);
    let system = doctype.system_id.as_deref().map(str::to_ascii_lowercase);
    if let Some(public) = &public {
        if QUIRKY_PUBLIC_EXACT.contains(&public.as_str()) {
            return CompatMode::Quirks;
        }
        if QUIRKY_PUBLIC_PREFIXES.iter().any(|p| public.starts_with(p)) {
            return CompatMode::Quirks;
        }
        if system.is_none()
            && QUIRKY_WHEN_NO_SYSTEM.iter().any(|p| public.starts_with(p))
        {
            return CompatMode::Quirks;
        }
    }
    if system.as_deref() == Some(QUIRKY_SYSTEM_EXACT) {
        return CompatMode::Quirks;
    }
    if let Some(public) = &public {
        if LIMITED_QUIRKS_PUBLIC_PREFIXES
            .iter()
            .any(|p| public.starts_with(p))
        {
            return CompatMode::LimitedQuirks;
        }
        if system.is_some()
            && QUIRKY_WHEN_NO_SYSTEM.iter().any(|p| public.starts_with(p))
        {
            return CompatMode::LimitedQuirks;
        }
    }
    CompatMode::NoQuirks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctype(name: Option<&str>, public: Option<&str>, system: Option<&str>) -> DoctypeToken {
        DoctypeToken {
            name: name.map(str::to_string),
            public_id: public.map(str::to_string),
            system_id: system.map(str::to_string),
            force_quirks: false,
        }
    }

    #[test]
    fn modern_doctype_is_no_quirks() {
        assert_eq!(
            mode_for_doctype(&doctype(Some("html"), None, None)),
            CompatMode::NoQuirks
        );
    }

    #[test]
    fn legacy_public_ids_trigger_quirks() {
        assert_eq!(
            mode_for_doctype(&doctype(Some("html"), Some("-//W3C//DTD HTML 3.2//EN"), None)),
            CompatMode::Quirks
        );
        assert_eq!(
            mode_for_doctype(&doctype(Some("html"), Some("HTML"), None)),
            CompatMode::Quirks
        );
        assert_eq!(
            mode_for_doctype(&doctype(Some("xhtml"), None, None)),
            CompatMode::Quirks
        );
    }

    #[test]
    fn html401_transitional_depends_on_system_id() {
        let public = Some("-//W3C//DTD HTML 4.01 Transitional//EN");
        assert_eq!(
            mode_for_doctype(&doctype(Some("html"), public, None)),
            CompatMode::Quirks
        );
        assert_eq!(
            mode_for_doctype(&doctype(
                Some("html"),
                public,
                Some("http://www.w3.org/TR/html4/loose.dtd")
            )),
            CompatMode::LimitedQuirks
        );
    }

    #[test]
    fn xhtml_transitional_is_limited_quirks() {
        assert_eq!(
            mode_for_doctype(&doctype(
                Some("html"),
                Some("-//W3C//DTD XHTML 1.0 Transitional//EN"),
                None
            )),
            CompatMode::LimitedQuirks
        );
    }
}
