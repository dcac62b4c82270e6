//! Legacy field tags.
//!
//! Tags keep the `v` prefix used in the `!TAG!content` export lines.

// Shared by article and issue records
pub const ISSN: &str = "v035";
pub const ISSUE_ORDER: &str = "v036";
pub const VOLUME: &str = "v031";
pub const NUMBER: &str = "v032";
pub const SUPPLEMENT_VOLUME: &str = "v131";
pub const SUPPLEMENT_NUMBER: &str = "v132";
pub const COLLECTION_PUBDATE: &str = "v065";
pub const SECTION: &str = "v049";

// Article records
pub const PID_V1: &str = "v002";
pub const CONTRIBUTOR: &str = "v010";
pub const TITLE: &str = "v012";
pub const PAGES: &str = "v014";
pub const LANGUAGE: &str = "v040";
pub const AFFILIATION: &str = "v070";
pub const DOCUMENT_TYPE: &str = "v071";
pub const ABSTRACT: &str = "v083";
pub const KEYWORDS: &str = "v085";
pub const CREATED_DATE: &str = "v091";
pub const UPDATED_DATE: &str = "v093";
pub const CITATION_NUMBER: &str = "v118";
pub const ORDER: &str = "v121";
pub const DOCUMENT_PUBDATE: &str = "v223";
pub const DOI: &str = "v237";
pub const NORMALIZED_AFFILIATION: &str = "v240";
pub const DOI_WITH_LANG: &str = "v337";
pub const TRANSLATED_LANGUAGES: &str = "v601";
pub const FILE_PATH: &str = "v702";
pub const PARAGRAPH_TEXT: &str = "v704";
pub const RECORD_TYPE: &str = "v706";
pub const PID_V2: &str = "v880";
pub const AOP_PID: &str = "v881";
pub const PID_V3: &str = "v885";
pub const PARAGRAPH_REFERENCE: &str = "v888";

// Issue records
pub const IS_PUBLIC: &str = "v042";

// Journal records
pub const PUBLICATION_STATUS: &str = "v050";
pub const STATUS_HISTORY: &str = "v051";
pub const COPYRIGHT_HOLDER: &str = "v062";
pub const PUBLISHER_ADDRESS: &str = "v063";
pub const EMAIL: &str = "v064";
pub const ACRONYM: &str = "v068";
pub const TITLE_FULL: &str = "v100";
pub const SPONSORS: &str = "v140";
pub const ABBREVIATED_TITLE: &str = "v150";
pub const ISO_ABBREVIATED_TITLE: &str = "v151";
pub const PUBLISHER_COUNTRY: &str = "v310";
pub const PUBLISHER_STATE: &str = "v320";
pub const JOURNAL_ID: &str = "v400";
pub const ISSN_WITH_TYPE: &str = "v435";
pub const SUBJECT_DESCRIPTORS: &str = "v440";
pub const STUDY_AREAS: &str = "v441";
pub const INDEX_AT: &str = "v450";
pub const PUBLISHER_NAME: &str = "v480";
pub const PUBLISHER_CITY: &str = "v490";
pub const OLD_TITLE: &str = "v610";
pub const SUBMISSION_URL: &str = "v692";
pub const NEW_TITLE: &str = "v710";
pub const SUBJECT_CATEGORIES: &str = "v854";
pub const MISSION: &str = "v901";
pub const ISSN_LEGACY: &str = "v935";
pub const JOURNAL_CREATED_DATE: &str = "v940";
pub const JOURNAL_UPDATED_DATE: &str = "v941";

/// Record types carried in [`RECORD_TYPE`].
pub mod record_types {
    pub const ARTICLE: &str = "h";
    pub const FORMATTED: &str = "f";
    pub const CITATION: &str = "c";
    pub const PARAGRAPH: &str = "p";
}
