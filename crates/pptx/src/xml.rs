//! Small helpers over `quick_xml` events.

use quick_xml::events::BytesStart;

/// Extract the local name from a potentially namespaced XML element name.
pub(crate) fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Unescaped value of the attribute with the exact qualified name `key`.
pub(crate) fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_attribute_unescapes() {
        let element = BytesStart::from_content(r#"Relationship Id="rId1" Target="a&amp;b.xml""#, 12);
        assert_eq!(attribute(&element, b"Id").as_deref(), Some("rId1"));
        assert_eq!(attribute(&element, b"Target").as_deref(), Some("a&b.xml"));
        assert_eq!(attribute(&element, b"Type"), None);
    }
}
