/// Canonical form of a header name: every `-`-separated word is lower-cased
/// with its first letter upper-cased (`content-type` becomes `Content-Type`).
/// Only ASCII letters are touched.
pub fn canonical_key(key: &str) -> String {
    let mut res = String::with_capacity(key.len());
    let mut upper = true;
    for c in key.chars() {
        if upper {
            res.push(c.to_ascii_uppercase());
        } else {
            res.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }
    res
}

pub(crate) fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| (33..=126).contains(&b) && b != b':')
}

/// Ordered multimap of header fields.
///
/// Keys are stored canonicalized and compared ASCII case-insensitively.
/// Iteration follows the order in which each key was first inserted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<(String, Vec<String>)>,
}

impl Headers {
    pub fn new() -> Headers {
        Headers::default()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(key))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// First value of `key`, if any
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(|v| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        match self.position(key) {
            Some(i) => &self.fields[i].1,
            None => &[],
        }
    }

    pub fn get_all_mut(&mut self, key: &str) -> Option<&mut Vec<String>> {
        let i = self.position(key)?;
        Some(&mut self.fields[i].1)
    }

    /// Replaces every value of `key` with `value`, keeping the key's position
    pub fn set<V: Into<String>>(&mut self, key: &str, value: V) {
        match self.position(key) {
            Some(i) => self.fields[i].1 = vec![value.into()],
            None => self
                .fields
                .push((canonical_key(key), vec![value.into()])),
        }
    }

    pub fn append<V: Into<String>>(&mut self, key: &str, value: V) {
        match self.position(key) {
            Some(i) => self.fields[i].1.push(value.into()),
            None => self
                .fields
                .push((canonical_key(key), vec![value.into()])),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        let i = self.position(key)?;
        Some(self.fields.remove(i).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}
