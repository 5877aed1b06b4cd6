// gstore: Rust client for signed REST object storage
// Copyright 2025 The gstore Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! XML documents exchanged with the service.
//!
//! Every field is kept as the string found in the document; a missing
//! element gives an empty string.

use xmltree::Element;

use crate::gs::error::Error;
use crate::gs::xml::{
    attribute, document_elements_by_tag_name, elements_by_tag_name, first_text, parse_document,
    push_child, push_text_child, value_from_elems, write_document,
};

/// Text of the last `tag` element below `element`.
fn text_of(element: &Element, tag: &str) -> String {
    value_from_elems(&elements_by_tag_name(element, tag))
}

/// One grant of an [`AccessControlList`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AclEntry {
    /// `READ`, `WRITE`, `FULL_CONTROL`
    pub permission: String,
    /// Scope kind such as `UserById`, `GroupByEmail` or `AllUsers`.
    pub scope_type: String,
    pub scope_user_id: String,
    pub scope_user_name: String,
    pub scope_email: String,
    pub scope_domain: String,
}

impl AclEntry {
    fn has_scope(&self) -> bool {
        !(self.scope_type.is_empty()
            && self.scope_user_id.is_empty()
            && self.scope_user_name.is_empty()
            && self.scope_email.is_empty()
            && self.scope_domain.is_empty())
    }

    fn from_xml(element: &Element) -> Self {
        let mut entry = AclEntry {
            permission: text_of(element, "Permission"),
            ..Default::default()
        };
        for scope in elements_by_tag_name(element, "Scope") {
            entry.scope_type = attribute(scope, "type");
            entry.scope_user_id = text_of(scope, "ID");
            entry.scope_user_name = text_of(scope, "Name");
            entry.scope_email = text_of(scope, "EmailAddress");
            entry.scope_domain = text_of(scope, "Domain");
        }
        entry
    }

    fn to_element(&self) -> Element {
        let mut node = Element::new("Entry");
        push_text_child(&mut node, "Permission", &self.permission);
        if self.has_scope() {
            let mut scope = Element::new("Scope");
            if !self.scope_type.is_empty() {
                scope
                    .attributes
                    .insert("type".to_string(), self.scope_type.clone());
            }
            push_text_child(&mut scope, "ID", &self.scope_user_id);
            push_text_child(&mut scope, "Name", &self.scope_user_name);
            push_text_child(&mut scope, "EmailAddress", &self.scope_email);
            push_text_child(&mut scope, "Domain", &self.scope_domain);
            push_child(&mut node, scope);
        }
        node
    }
}

/// Owner and grants of a bucket or object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessControlList {
    pub owner_id: String,
    pub owner_name: String,
    pub entries: Vec<AclEntry>,
}

impl AccessControlList {
    pub fn new(owner_id: impl Into<String>, owner_name: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            owner_name: owner_name.into(),
            entries: Vec::new(),
        }
    }

    /// Appends a grant.
    pub fn add_entry(&mut self, entry: AclEntry) -> &mut Self {
        self.entries.push(entry);
        self
    }

    pub fn from_xml(body: &[u8]) -> Result<Self, Error> {
        let root = parse_document(body)?;
        let mut acl = AccessControlList::default();
        for owner in document_elements_by_tag_name(&root, "Owner") {
            acl.owner_id = text_of(owner, "ID");
            acl.owner_name = text_of(owner, "Name");
        }
        for entries in document_elements_by_tag_name(&root, "Entries") {
            for entry in elements_by_tag_name(entries, "Entry") {
                acl.entries.push(AclEntry::from_xml(entry));
            }
        }
        Ok(acl)
    }

    /// Serializes the list. Empty fields are left out, so an entry with
    /// nothing set comes back as a bare `<Entry/>`.
    pub fn to_xml(&self, pretty: bool) -> Result<String, Error> {
        let mut root = Element::new("AccessControlList");
        if !self.owner_id.is_empty() || !self.owner_name.is_empty() {
            let mut owner = Element::new("Owner");
            push_text_child(&mut owner, "ID", &self.owner_id);
            push_text_child(&mut owner, "Name", &self.owner_name);
            push_child(&mut root, owner);
        }
        if !self.entries.is_empty() {
            let mut entries = Element::new("Entries");
            for entry in &self.entries {
                push_child(&mut entries, entry.to_element());
            }
            push_child(&mut root, entries);
        }
        write_document(&root, pretty)
    }
}

/// A bucket in a service listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BucketEntry {
    pub name: String,
    pub creation_date: String,
}

/// Response of a service GET (`ListAllMyBucketsResult`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BucketListResult {
    pub owner_id: String,
    pub owner_display_name: String,
    pub buckets: Vec<BucketEntry>,
}

impl BucketListResult {
    pub fn from_xml(body: &[u8]) -> Result<Self, Error> {
        let root = parse_document(body)?;
        let mut result = BucketListResult::default();
        for owner in document_elements_by_tag_name(&root, "Owner") {
            result.owner_id = text_of(owner, "ID");
            result.owner_display_name = text_of(owner, "DisplayName");
        }
        for buckets in document_elements_by_tag_name(&root, "Buckets") {
            for bucket in elements_by_tag_name(buckets, "Bucket") {
                result.buckets.push(BucketEntry {
                    name: text_of(bucket, "Name"),
                    creation_date: text_of(bucket, "CreationDate"),
                });
            }
        }
        Ok(result)
    }

    pub fn bucket_names(&self) -> Vec<String> {
        self.buckets.iter().map(|b| b.name.clone()).collect()
    }
}

/// An object in a bucket listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub last_modified: String,
    pub etag: String,
    pub size: String,
    pub storage_class: String,
    pub owner_id: String,
    pub owner_display_name: String,
}

/// Response of a bucket GET (`ListBucketResult`).
///
/// `name`, `prefix`, `marker` and `is_truncated` are looked up anywhere in
/// the document, so with a delimiter `prefix` can end up holding the last
/// common prefix rather than the requested one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectListResult {
    pub name: String,
    pub prefix: String,
    pub marker: String,
    /// `"true"` when more keys are available.
    pub is_truncated: String,
    pub contents: Vec<ObjectEntry>,
    pub common_prefixes: Vec<String>,
}

impl ObjectListResult {
    pub fn from_xml(body: &[u8]) -> Result<Self, Error> {
        let root = parse_document(body)?;
        let doc_text = |tag: &str| value_from_elems(&document_elements_by_tag_name(&root, tag));

        let mut result = ObjectListResult {
            name: doc_text("Name"),
            prefix: doc_text("Prefix"),
            marker: doc_text("Marker"),
            is_truncated: doc_text("IsTruncated"),
            ..Default::default()
        };

        for contents in document_elements_by_tag_name(&root, "Contents") {
            let mut entry = ObjectEntry {
                key: text_of(contents, "Key"),
                last_modified: text_of(contents, "LastModified"),
                etag: text_of(contents, "ETag"),
                size: text_of(contents, "Size"),
                storage_class: text_of(contents, "StorageClass"),
                ..Default::default()
            };
            for owner in elements_by_tag_name(contents, "Owner") {
                entry.owner_id = text_of(owner, "ID");
                entry.owner_display_name = text_of(owner, "DisplayName");
            }
            result.contents.push(entry);
        }

        for prefixes in document_elements_by_tag_name(&root, "CommonPrefixes") {
            for prefix in elements_by_tag_name(prefixes, "Prefix") {
                result.common_prefixes.push(first_text(prefix));
            }
        }
        Ok(result)
    }

    pub fn is_truncated(&self) -> bool {
        self.is_truncated == "true"
    }

    pub fn keys(&self) -> Vec<String> {
        self.contents.iter().map(|c| c.key.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_full_entry(n: u32) -> AclEntry {
        AclEntry {
            permission: format!("PERM{n}"),
            scope_type: format!("Type{n}"),
            scope_user_id: format!("id{n}"),
            scope_user_name: format!("name <{n}>"),
            scope_email: format!("user{n}@example.com"),
            scope_domain: format!("example{n}.com"),
        }
    }

    #[test]
    fn test_acl_round_trip() {
        let mut acl = AccessControlList::new("owner-id", "Owner & Co");
        acl.add_entry(get_full_entry(1)).add_entry(get_full_entry(2));
        for pretty in [false, true] {
            let body = acl.to_xml(pretty).unwrap();
            let parsed = AccessControlList::from_xml(body.as_bytes()).unwrap();
            assert_eq!(parsed, acl);
        }
    }

    #[test]
    fn test_acl_to_xml_omits_empty_fields() {
        let mut acl = AccessControlList::default();
        acl.add_entry(AclEntry {
            permission: "READ".to_string(),
            scope_type: "AllUsers".to_string(),
            ..Default::default()
        });
        acl.add_entry(AclEntry::default());
        assert_eq!(
            acl.to_xml(false).unwrap(),
            r#"<?xml version="1.0" encoding="UTF-8"?><AccessControlList><Entries><Entry><Permission>READ</Permission><Scope type="AllUsers"/></Entry><Entry/></Entries></AccessControlList>"#
        );

        let body = acl.to_xml(false).unwrap();
        let parsed = AccessControlList::from_xml(body.as_bytes()).unwrap();
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[1], AclEntry::default());
    }

    #[test]
    fn test_acl_empty() {
        assert_eq!(
            AccessControlList::default().to_xml(false).unwrap(),
            r#"<?xml version="1.0" encoding="UTF-8"?><AccessControlList/>"#
        );
    }

    #[test]
    fn test_acl_from_xml() {
        let body = br#"<?xml version="1.0" encoding="UTF-8"?>
<AccessControlList>
  <Owner><ID>00b4903a97</ID><Name>OwnerName</Name></Owner>
  <Entries>
    <Entry>
      <Scope type="UserByEmail">
        <EmailAddress>jane@example.com</EmailAddress>
        <Name>Jane</Name>
      </Scope>
      <Permission>READ</Permission>
    </Entry>
    <Entry>
      <Scope type="AllUsers"/>
      <Permission>READ</Permission>
    </Entry>
  </Entries>
</AccessControlList>"#;
        let acl = AccessControlList::from_xml(body).unwrap();
        assert_eq!(acl.owner_id, "00b4903a97");
        assert_eq!(acl.owner_name, "OwnerName");
        assert_eq!(acl.entries.len(), 2);
        assert_eq!(acl.entries[0].scope_type, "UserByEmail");
        assert_eq!(acl.entries[0].scope_email, "jane@example.com");
        assert_eq!(acl.entries[0].scope_user_name, "Jane");
        assert_eq!(acl.entries[0].scope_user_id, "");
        assert_eq!(acl.entries[1].scope_type, "AllUsers");
        assert_eq!(acl.entries[1].permission, "READ");
    }

    #[test]
    fn test_acl_duplicate_owner_id_last_wins() {
        let body = b"<AccessControlList><Owner><ID>first</ID><ID>second</ID></Owner></AccessControlList>";
        let acl = AccessControlList::from_xml(body).unwrap();
        assert_eq!(acl.owner_id, "second");
        assert!(acl.entries.is_empty());
    }

    #[test]
    fn test_acl_malformed() {
        assert!(matches!(
            AccessControlList::from_xml(b"<AccessControlList><Owner>"),
            Err(Error::XmlParse(_))
        ));
    }

    #[test]
    fn test_bucket_list_result() {
        let body = br#"<?xml version="1.0" encoding="UTF-8"?>
<ListAllMyBucketsResult>
  <Owner><ID>1234</ID><DisplayName>Me</DisplayName></Owner>
  <Buckets>
    <Bucket><Name>alpha</Name><CreationDate>2013-01-01T00:00:00.000Z</CreationDate></Bucket>
    <Bucket><Name>beta</Name><CreationDate>2013-01-02T00:00:00.000Z</CreationDate></Bucket>
  </Buckets>
</ListAllMyBucketsResult>"#;
        let result = BucketListResult::from_xml(body).unwrap();
        assert_eq!(result.owner_id, "1234");
        assert_eq!(result.owner_display_name, "Me");
        assert_eq!(result.bucket_names(), vec!["alpha", "beta"]);
        assert_eq!(result.buckets[1].creation_date, "2013-01-02T00:00:00.000Z");
    }

    #[test]
    fn test_bucket_list_result_empty() {
        let result = BucketListResult::from_xml(b"<ListAllMyBucketsResult/>").unwrap();
        assert_eq!(result, BucketListResult::default());
    }

    #[test]
    fn test_object_list_result() {
        let body = br#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult>
  <Name>photos</Name>
  <Prefix>2013/</Prefix>
  <Marker></Marker>
  <IsTruncated>true</IsTruncated>
  <Contents>
    <Key>2013/a.jpg</Key>
    <LastModified>2013-01-01T00:00:00.000Z</LastModified>
    <ETag>"abc"</ETag>
    <Size>10</Size>
    <StorageClass>STANDARD</StorageClass>
    <Owner><ID>o1</ID><DisplayName>Owner One</DisplayName></Owner>
  </Contents>
  <Contents>
    <Key>2013/b.jpg</Key>
    <Size>20</Size>
  </Contents>
</ListBucketResult>"#;
        let result = ObjectListResult::from_xml(body).unwrap();
        assert_eq!(result.name, "photos");
        assert_eq!(result.prefix, "2013/");
        assert_eq!(result.marker, "");
        assert!(result.is_truncated());
        assert_eq!(result.keys(), vec!["2013/a.jpg", "2013/b.jpg"]);
        assert_eq!(result.contents[0].etag, "\"abc\"");
        assert_eq!(result.contents[0].owner_display_name, "Owner One");
        assert_eq!(result.contents[1].size, "20");
        assert_eq!(result.contents[1].owner_id, "");
        assert!(result.common_prefixes.is_empty());
    }

    #[test]
    fn test_object_list_result_common_prefixes() {
        let body = br#"<ListBucketResult>
  <Name>photos</Name>
  <Prefix></Prefix>
  <IsTruncated>false</IsTruncated>
  <CommonPrefixes><Prefix>2012/</Prefix></CommonPrefixes>
  <CommonPrefixes><Prefix>2013/</Prefix></CommonPrefixes>
</ListBucketResult>"#;
        let result = ObjectListResult::from_xml(body).unwrap();
        assert_eq!(result.common_prefixes, vec!["2012/", "2013/"]);
        assert!(!result.is_truncated());
        // Prefix is searched document wide.
        assert_eq!(result.prefix, "2013/");
    }
}
