/// Result of an indicator or window request.
///
/// `InsufficientData` is a normal outcome while history is still filling up;
/// it is never an error and never stands in for a zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading<T> {
    Value(T),
    InsufficientData,
}

impl<T> Reading<T> {
    pub fn is_value(&self) -> bool {
        matches!(self, Reading::Value(_))
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self, Reading::InsufficientData)
    }

    pub fn value(self) -> Option<T> {
        match self {
            Reading::Value(v) => Some(v),
            Reading::InsufficientData => None,
        }
    }

    pub fn as_ref(&self) -> Reading<&T> {
        match self {
            Reading::Value(v) => Reading::Value(v),
            Reading::InsufficientData => Reading::InsufficientData,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Reading<U> {
        match self {
            Reading::Value(v) => Reading::Value(f(v)),
            Reading::InsufficientData => Reading::InsufficientData,
        }
    }

    pub fn and_then<U, F: FnOnce(T) -> Reading<U>>(self, f: F) -> Reading<U> {
        match self {
            Reading::Value(v) => f(v),
            Reading::InsufficientData => Reading::InsufficientData,
        }
    }
}

impl<T> From<Option<T>> for Reading<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Reading::Value(v),
            None => Reading::InsufficientData,
        }
    }
}

impl<T> From<Reading<T>> for Option<T> {
    fn from(reading: Reading<T>) -> Self {
        reading.value()
    }
}
