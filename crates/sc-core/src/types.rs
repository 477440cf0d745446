//! Bitmask definitions shared by the rule model
//!
//! Network rule options and content types are kept as bit flags so that rules stay
//! small and option checks are a single mask test.

// =============================================================================
// Network Rule Options
// =============================================================================

bitflags::bitflags! {
    /// Options enabled on a network rule.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NetworkRuleOption: u32 {
        /// $important - ignores exception filters
        const IMPORTANT = 1 << 0;
        /// Case-sensitive matching ($match-case)
        const MATCH_CASE = 1 << 1;
        /// $badfilter - disables the identical rule
        const BADFILTER = 1 << 2;
        /// $popup
        const POPUP = 1 << 3;
        /// $document - whitelists the whole page
        const DOCUMENT = 1 << 4;
        /// $elemhide - disables element hiding
        const ELEMHIDE = 1 << 5;
        /// $generichide - disables generic element hiding
        const GENERICHIDE = 1 << 6;
        /// $specifichide - disables domain-specific element hiding
        const SPECIFICHIDE = 1 << 7;
        /// $jsinject - disables script and scriptlet injection
        const JSINJECT = 1 << 8;
        /// $urlblock - disables URL blocking
        const URLBLOCK = 1 << 9;
        /// $content
        const CONTENT = 1 << 10;
        /// $genericblock
        const GENERICBLOCK = 1 << 11;

        /// Options that only make sense on page-level exceptions
        const WHITELIST_ONLY = Self::DOCUMENT.bits()
            | Self::ELEMHIDE.bits()
            | Self::GENERICHIDE.bits()
            | Self::SPECIFICHIDE.bits()
            | Self::JSINJECT.bits()
            | Self::URLBLOCK.bits()
            | Self::CONTENT.bits()
            | Self::GENERICBLOCK.bits();
    }
}

impl NetworkRuleOption {
    /// Parse an option name without its `~` prefix.
    pub fn from_option_name(name: &str) -> Option<Self> {
        match name {
            "important" => Some(Self::IMPORTANT),
            "match-case" => Some(Self::MATCH_CASE),
            "badfilter" => Some(Self::BADFILTER),
            "popup" => Some(Self::POPUP),
            "document" | "doc" => Some(Self::DOCUMENT),
            "elemhide" | "ehide" => Some(Self::ELEMHIDE),
            "generichide" | "ghide" => Some(Self::GENERICHIDE),
            "specifichide" | "shide" => Some(Self::SPECIFICHIDE),
            "jsinject" => Some(Self::JSINJECT),
            "urlblock" => Some(Self::URLBLOCK),
            "content" => Some(Self::CONTENT),
            "genericblock" => Some(Self::GENERICBLOCK),
            _ => None,
        }
    }
}

// =============================================================================
// Content Types
// =============================================================================

bitflags::bitflags! {
    /// Request content types a network rule applies to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ContentType: u32 {
        const IMAGE = 1 << 0;
        const STYLESHEET = 1 << 1;
        const SCRIPT = 1 << 2;
        const MEDIA = 1 << 3;
        const XMLHTTPREQUEST = 1 << 4;
        const OTHER = 1 << 5;
        const WEBSOCKET = 1 << 6;
        const FONT = 1 << 7;
        const PING = 1 << 8;
        const SUBDOCUMENT = 1 << 9;  // iframe/frame
        const OBJECT = 1 << 10;
        const DOCUMENT = 1 << 11;    // main document

        /// All request types
        const ALL = (1 << 12) - 1;
    }
}

impl ContentType {
    /// Parse a content type modifier name without its `~` prefix.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "image" => Some(Self::IMAGE),
            "stylesheet" | "css" => Some(Self::STYLESHEET),
            "script" => Some(Self::SCRIPT),
            "media" => Some(Self::MEDIA),
            "xmlhttprequest" | "xhr" => Some(Self::XMLHTTPREQUEST),
            "other" => Some(Self::OTHER),
            "websocket" => Some(Self::WEBSOCKET),
            "font" => Some(Self::FONT),
            "ping" => Some(Self::PING),
            "subdocument" | "frame" => Some(Self::SUBDOCUMENT),
            "object" => Some(Self::OBJECT),
            _ => None,
        }
    }

    /// Safari `resource-type` values covering this mask, in a stable order.
    pub fn safari_resource_types(self) -> Vec<&'static str> {
        let mut types = Vec::new();
        if self.contains(Self::IMAGE) {
            types.push("image");
        }
        if self.contains(Self::STYLESHEET) {
            types.push("style-sheet");
        }
        if self.contains(Self::SCRIPT) {
            types.push("script");
        }
        if self.intersects(Self::MEDIA | Self::OBJECT) {
            types.push("media");
        }
        if self.intersects(Self::XMLHTTPREQUEST | Self::OTHER | Self::WEBSOCKET | Self::PING) {
            types.push("raw");
        }
        if self.contains(Self::FONT) {
            types.push("font");
        }
        if self.intersects(Self::SUBDOCUMENT | Self::DOCUMENT) {
            types.push("document");
        }
        types
    }
}
