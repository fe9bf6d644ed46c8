//! Borrowed-or-owned stored values.
//!
//! A map entry either borrows its value from the caller, who keeps it
//! alive, or owns a boxed copy that is dropped with the entry. The variant
//! decides what happens on removal and on drop of the map; there is no
//! separate ownership flag to keep in sync.

use core::fmt;
use core::ops::Deref;

pub enum Value<'a, T: ?Sized> {
    Borrowed(&'a T),
    Owned(Box<T>),
}

impl<'a, T: ?Sized> Value<'a, T> {
    pub fn owned(value: impl Into<Box<T>>) -> Self {
        Value::Owned(value.into())
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Value::Owned(_))
    }

    pub fn is_borrowed(&self) -> bool {
        matches!(self, Value::Borrowed(_))
    }

    /// Copies a borrowed value into an owned box; owned values pass through.
    pub fn into_owned(self) -> Box<T>
    where
        Box<T>: for<'b> From<&'b T>,
    {
        match self {
            Value::Borrowed(v) => Box::from(v),
            Value::Owned(b) => b,
        }
    }
}

impl<'a, T: ?Sized> Deref for Value<'a, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        match self {
            Value::Borrowed(v) => v,
            Value::Owned(b) => b,
        }
    }
}

impl<'a, T: ?Sized> AsRef<T> for Value<'a, T> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<'a, T: ?Sized> From<&'a T> for Value<'a, T> {
    fn from(v: &'a T) -> Self {
        Value::Borrowed(v)
    }
}

impl<'a, T: ?Sized> Clone for Value<'a, T>
where
    Box<T>: Clone,
{
    fn clone(&self) -> Self {
        match self {
            Value::Borrowed(v) => Value::Borrowed(*v),
            Value::Owned(b) => Value::Owned(b.clone()),
        }
    }
}

impl<'a, T: ?Sized + fmt::Debug> fmt::Debug for Value<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Borrowed(v) => f.debug_tuple("Borrowed").field(v).finish(),
            Value::Owned(b) => f.debug_tuple("Owned").field(b).finish(),
        }
    }
}

/// Compares the referenced values, regardless of ownership.
impl<'a, 'b, T: ?Sized + PartialEq> PartialEq<Value<'b, T>> for Value<'a, T> {
    fn eq(&self, other: &Value<'b, T>) -> bool {
        **self == **other
    }
}

impl<'a, T: ?Sized + Eq> Eq for Value<'a, T> {}

#[cfg(test)]
mod tests {
    use super::Value;
    use std::rc::Rc;

    #[test]
    fn deref_reads_through_either_variant() {
        let data = [1u8, 2, 3];
        let b: Value<'_, [u8]> = Value::Borrowed(&data);
        let o: Value<'_, [u8]> = Value::owned(vec![1u8, 2, 3]);
        assert_eq!(&*b, &[1, 2, 3]);
        assert_eq!(&*o, &[1, 2, 3]);
        assert_eq!(b, o);
        assert!(b.is_borrowed() && !b.is_owned());
        assert!(o.is_owned() && !o.is_borrowed());
    }

    #[test]
    fn into_owned_copies_borrowed_bytes() {
        let data = String::from("abc");
        let v: Value<'_, str> = Value::from(data.as_str());
        let boxed = v.into_owned();
        assert_eq!(&*boxed, "abc");
    }

    /// Dropping an owned value releases it; a borrowed one leaves the
    /// caller's value alone.
    #[test]
    fn only_owned_values_are_dropped() {
        let shared = Rc::new(5);
        {
            let _b: Value<'_, Rc<i32>> = Value::Borrowed(&shared);
            assert_eq!(Rc::strong_count(&shared), 1);
        }
        assert_eq!(Rc::strong_count(&shared), 1);
        {
            let _o: Value<'_, Rc<i32>> = Value::Owned(Box::new(shared.clone()));
            assert_eq!(Rc::strong_count(&shared), 2);
        }
        assert_eq!(Rc::strong_count(&shared), 1);
    }

    #[test]
    fn clone_keeps_the_variant() {
        let s = String::from("x");
        let b: Value<'_, str> = Value::Borrowed(&s);
        let o: Value<'_, str> = Value::owned("y");
        assert!(b.clone().is_borrowed());
        assert!(o.clone().is_owned());
        assert_eq!(format!("{:?}", o), "Owned(\"y\")");
    }
}
