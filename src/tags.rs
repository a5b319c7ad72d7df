use std::borrow::Cow;
use std::slice;

use log::kv::{self, Key, Source, VisitSource};
use serde_json::Value;

/**
A key/value pair attached to a log record.

Tags are immutable once created.
*/
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Tag {
    key: Cow<'static, str>,
    value: Value,
}

/**
Create a tag.

```
use log_ctxt::tag;

let tag = tag("correlation", "An Id");

assert_eq!("correlation", tag.key());
```
*/
pub fn tag<K, V>(key: K, value: V) -> Tag
where
    K: Into<Cow<'static, str>>,
    V: Into<Value>,
{
    Tag::new(key, value)
}

impl Tag {
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: Into<Cow<'static, str>>,
        V: Into<Value>,
    {
        Tag {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/**
An ordered list of tags bound to a logger.

This list is optimised for loggers that carry no tags or a single tag.
Tags are only ever appended, so duplicate keys may appear more than once.
*/
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Tags {
    Empty,
    Single(Tag),
    Many(Vec<Tag>),
}

impl Default for Tags {
    fn default() -> Self {
        Tags::Empty
    }
}

impl Tags {
    pub(crate) fn push(&mut self, tag: Tag) {
        match std::mem::take(self) {
            Tags::Empty => *self = Tags::Single(tag),
            Tags::Single(first) => *self = Tags::Many(vec![first, tag]),
            Tags::Many(mut tags) => {
                tags.push(tag);
                *self = Tags::Many(tags);
            }
        }
    }

    pub(crate) fn extend_from_slice(&mut self, tags: &[Tag]) {
        for tag in tags {
            self.push(tag.clone());
        }
    }

    /// A new list with `tags` appended after the ones in `self`.
    pub(crate) fn appended(&self, tags: &[Tag]) -> Self {
        let mut appended = self.clone();
        appended.extend_from_slice(tags);

        appended
    }

    pub(crate) fn as_slice(&self) -> &[Tag] {
        match *self {
            Tags::Empty => &[],
            Tags::Single(ref tag) => slice::from_ref(tag),
            Tags::Many(ref tags) => tags,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.as_slice().len()
    }
}

/**
The tags bound to a logger followed by the tags passed to a single call.
*/
pub(crate) struct Chain<'a> {
    pub(crate) bound: &'a Tags,
    pub(crate) call: &'a [Tag],
}

impl<'a> Source for Chain<'a> {
    fn visit<'kvs>(&'kvs self, visitor: &mut dyn VisitSource<'kvs>) -> Result<(), kv::Error> {
        self.bound.visit(visitor)?;
        visit_tags(self.call, visitor)
    }

    fn count(&self) -> usize {
        self.bound.len() + self.call.len()
    }
}

impl Source for Tags {
    fn visit<'kvs>(&'kvs self, visitor: &mut dyn VisitSource<'kvs>) -> Result<(), kv::Error> {
        visit_tags(self.as_slice(), visitor)
    }

    fn count(&self) -> usize {
        self.len()
    }
}

fn visit_tags<'kvs>(
    tags: &'kvs [Tag],
    visitor: &mut dyn VisitSource<'kvs>,
) -> Result<(), kv::Error> {
    for tag in tags {
        visitor.visit_pair(Key::from_str(tag.key()), to_kv_value(tag.value()))?;
    }

    Ok(())
}

fn to_kv_value(value: &Value) -> kv::Value<'_> {
    match *value {
        Value::Null => kv::Value::null(),
        Value::Bool(b) => kv::Value::from(b),
        Value::String(ref s) => kv::Value::from(s.as_str()),
        Value::Number(ref n) => {
            if let Some(n) = n.as_i64() {
                kv::Value::from(n)
            } else if let Some(n) = n.as_u64() {
                kv::Value::from(n)
            } else {
                kv::Value::from(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::Array(_) | Value::Object(_) => kv::Value::from_serde(value),
    }
}
