//! IRIs used by the loader, the bundled rules, and the queries.

/// `rdf:type`.
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
/// `rdf:first`.
pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
/// `rdf:rest`.
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
/// `rdf:nil`.
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
/// `rdf:langString`.
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
/// `rdf:JSON`.
pub const RDF_JSON: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#JSON";

/// `xsd:string`.
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
/// `xsd:boolean`.
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
/// `xsd:integer`.
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
/// `xsd:decimal`.
pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
/// `xsd:double`.
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";

/// W3C Verifiable Credentials namespace (shared by the v1 and v2 contexts).
pub const CRED_NS: &str = "https://www.w3.org/2018/credentials#";
/// `cred:VerifiableCredential`.
pub const CRED_VERIFIABLE_CREDENTIAL: &str = "https://www.w3.org/2018/credentials#VerifiableCredential";
/// `cred:issuer`.
pub const CRED_ISSUER: &str = "https://www.w3.org/2018/credentials#issuer";
/// `cred:credentialSubject`.
pub const CRED_CREDENTIAL_SUBJECT: &str = "https://www.w3.org/2018/credentials#credentialSubject";

/// `schema:name`.
pub const SCHEMA_NAME: &str = "https://schema.org/name";

/// UNTP core vocabulary namespace.
pub const UNTP_NS: &str = "https://test.uncefact.org/vocabulary/untp/core/0/";
/// `untp:DigitalProductPassport`.
pub const UNTP_DIGITAL_PRODUCT_PASSPORT: &str = "https://test.uncefact.org/vocabulary/untp/core/0/DigitalProductPassport";
/// `untp:DigitalConformityCredential`.
pub const UNTP_DIGITAL_CONFORMITY_CREDENTIAL: &str = "https://test.uncefact.org/vocabulary/untp/core/0/DigitalConformityCredential";
/// `untp:DigitalIdentityAnchor`.
pub const UNTP_DIGITAL_IDENTITY_ANCHOR: &str = "https://test.uncefact.org/vocabulary/untp/core/0/DigitalIdentityAnchor";
/// `untp:product`.
pub const UNTP_PRODUCT: &str = "https://test.uncefact.org/vocabulary/untp/core/0/product";
/// `untp:conformityClaim`.
pub const UNTP_CONFORMITY_CLAIM: &str = "https://test.uncefact.org/vocabulary/untp/core/0/conformityClaim";
/// `untp:conformityTopic`.
pub const UNTP_CONFORMITY_TOPIC: &str = "https://test.uncefact.org/vocabulary/untp/core/0/conformityTopic";
/// `untp:conformance`.
pub const UNTP_CONFORMANCE: &str = "https://test.uncefact.org/vocabulary/untp/core/0/conformance";
/// `untp:referenceCriteria`.
pub const UNTP_REFERENCE_CRITERIA: &str = "https://test.uncefact.org/vocabulary/untp/core/0/referenceCriteria";
/// `untp:assessment`.
pub const UNTP_ASSESSMENT: &str = "https://test.uncefact.org/vocabulary/untp/core/0/assessment";
/// `untp:assessedProduct`.
pub const UNTP_ASSESSED_PRODUCT: &str = "https://test.uncefact.org/vocabulary/untp/core/0/assessedProduct";

/// Namespace of facts derived by the bundled rule modules.
pub const INF_NS: &str = "urn:untp:inference:";
/// `inf:claimsAttestedBy` — passport to the conformity credentials backing its claims.
pub const INF_CLAIMS_ATTESTED_BY: &str = "urn:untp:inference:claimsAttestedBy";
/// `inf:issuerIdentityAttestedBy` — credential to the identity anchor vouching for its issuer.
pub const INF_ISSUER_IDENTITY_ATTESTED_BY: &str = "urn:untp:inference:issuerIdentityAttestedBy";
/// `inf:verified` — a criterion (or simple claim) is verified.
pub const INF_VERIFIED: &str = "urn:untp:inference:verified";
/// `inf:verifiedBy` — the credential that verified a criterion or simple claim.
pub const INF_VERIFIED_BY: &str = "urn:untp:inference:verifiedBy";
/// `inf:hasUnverifiedCriterion`.
pub const INF_HAS_UNVERIFIED_CRITERION: &str = "urn:untp:inference:hasUnverifiedCriterion";
/// `inf:allCriteriaVerified`.
pub const INF_ALL_CRITERIA_VERIFIED: &str = "urn:untp:inference:allCriteriaVerified";

/// N3 `log:` builtin namespace.
pub const LOG_NS: &str = "http://www.w3.org/2000/10/swap/log#";
/// `log:notIncludes`.
pub const LOG_NOT_INCLUDES: &str = "http://www.w3.org/2000/10/swap/log#notIncludes";
/// `log:equalTo`.
pub const LOG_EQUAL_TO: &str = "http://www.w3.org/2000/10/swap/log#equalTo";
/// `log:notEqualTo`.
pub const LOG_NOT_EQUAL_TO: &str = "http://www.w3.org/2000/10/swap/log#notEqualTo";

/// Named graph used when a document has neither a source id nor its own id.
pub const UNNAMED_GRAPH: &str = "urn:untp:graph:unnamed";
/// Prefix for named graphs derived from non-IRI source identifiers.
pub const SOURCE_GRAPH_PREFIX: &str = "urn:untp:source:";

/// Prefixes predeclared for every rule module and query.
pub const DEFAULT_PREFIXES: &[(&str, &str)] = &[
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ("cred", CRED_NS),
    ("schema", "https://schema.org/"),
    ("untp", UNTP_NS),
    ("inf", INF_NS),
    ("log", LOG_NS),
];
