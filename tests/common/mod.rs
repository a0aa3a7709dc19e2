//! Shared fixtures and helpers for the integration tests
#![allow(dead_code)]

use std::path::PathBuf;

use libxml_xsd::{Document, Schema};

/// Test fixture paths
pub struct TestFixtures {
    pub fixtures_dir: PathBuf,
}

impl TestFixtures {
    pub fn new() -> Self {
        let fixtures_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures");

        Self { fixtures_dir }
    }

    pub fn schemas_dir(&self) -> PathBuf {
        self.fixtures_dir.join("schemas")
    }

    pub fn xml_valid_dir(&self) -> PathBuf {
        self.fixtures_dir.join("xml").join("valid")
    }

    pub fn xml_invalid_dir(&self) -> PathBuf {
        self.fixtures_dir.join("xml").join("invalid")
    }

    pub fn xml_malformed_dir(&self) -> PathBuf {
        self.fixtures_dir.join("xml").join("malformed")
    }

    pub fn configs_dir(&self) -> PathBuf {
        self.fixtures_dir.join("configs")
    }

    pub fn id_schema(&self) -> PathBuf {
        self.schemas_dir().join("id.xsd")
    }

    pub fn items_schema(&self) -> PathBuf {
        self.schemas_dir().join("items.xsd")
    }

    pub fn order_schema(&self) -> PathBuf {
        self.schemas_dir().join("order.xsd")
    }

    pub fn not_a_schema(&self) -> PathBuf {
        self.schemas_dir().join("not_a_schema.xsd")
    }

    pub fn unresolved_type_schema(&self) -> PathBuf {
        self.schemas_dir().join("unresolved_type.xsd")
    }

    pub fn malformed_schema(&self) -> PathBuf {
        self.schemas_dir().join("malformed.xsd")
    }

    pub fn id_valid_xml(&self) -> PathBuf {
        self.xml_valid_dir().join("id_valid.xml")
    }

    pub fn id_invalid_xml(&self) -> PathBuf {
        self.xml_invalid_dir().join("id_invalid.xml")
    }

    pub fn order_valid_xml(&self) -> PathBuf {
        self.xml_valid_dir().join("order_valid.xml")
    }

    pub fn order_invalid_xml(&self) -> PathBuf {
        self.xml_invalid_dir().join("order_invalid.xml")
    }

    pub fn malformed_xml(&self) -> PathBuf {
        self.xml_malformed_dir().join("not_well_formed.xml")
    }

    pub fn config(&self, name: &str) -> PathBuf {
        self.configs_dir().join(name)
    }
}

pub const ID_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element name="root">
        <xs:complexType>
            <xs:sequence>
                <xs:element name="id" type="xs:integer"/>
            </xs:sequence>
        </xs:complexType>
    </xs:element>
</xs:schema>"#;

pub const ITEMS_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element name="items">
        <xs:complexType>
            <xs:sequence>
                <xs:element name="item" type="xs:integer" minOccurs="0" maxOccurs="unbounded"/>
            </xs:sequence>
        </xs:complexType>
    </xs:element>
</xs:schema>"#;

pub const NOT_A_SCHEMA: &str = "<invalid>not a schema</invalid>";

/// An `items` document with `good` integer items followed by `bad` non-integer ones.
///
/// Each item sits on its own line, so the bad ones start at line `good + 2`.
pub fn items_document(good: usize, bad: usize) -> String {
    let mut xml = String::from("<items>\n");
    for i in 0..good {
        xml.push_str(&format!("  <item>{}</item>\n", i));
    }
    for i in 0..bad {
        xml.push_str(&format!("  <item>bad-{}</item>\n", i));
    }
    xml.push_str("</items>\n");
    xml
}

pub fn compile(source: &str) -> Schema {
    Schema::parse_str(source).expect("fixture schema should compile")
}

pub fn parse(source: &str) -> Document {
    Document::parse_str(source).expect("fixture document should be well-formed")
}
