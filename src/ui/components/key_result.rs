/// Outcome of offering a key to a component.
///
/// Components return this to their parent view, which either reacts to the
/// event or tries the next handler when the key was not consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Key was consumed, no event for parent to handle
  Handled,
  /// Key was consumed, here's an event for parent to process
  Event(T),
  /// Key was not consumed, parent should try next handler
  NotHandled,
}

impl<T> KeyResult<T> {
  /// Whether the component consumed the key
  pub fn is_consumed(&self) -> bool {
    !matches!(self, KeyResult::NotHandled)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_is_consumed() {
    assert!(KeyResult::<()>::Handled.is_consumed());
    assert!(KeyResult::Event(1).is_consumed());
    assert!(!KeyResult::<()>::NotHandled.is_consumed());
  }
}
