use std::rc::Rc;

use crate::assign::{AssignmentSource, Assignments};
use crate::host::WindowId;
use crate::variant::ShaderVariant;

/// Picks the shader to draw with from a window's rule and dispatch
/// assignments. Either one alone wins; when both are present and name
/// different shaders the dispatch assignment wins, otherwise the rule's.
pub fn effective<'a>(
    rule: Option<&'a Rc<ShaderVariant>>,
    dispatch: Option<&'a Rc<ShaderVariant>>,
) -> Option<(&'a Rc<ShaderVariant>, AssignmentSource)> {
    match (rule, dispatch) {
        (None, None) => None,
        (Some(rule), None) => Some((rule, AssignmentSource::Rule)),
        (None, Some(dispatch)) => Some((dispatch, AssignmentSource::Dispatch)),
        (Some(rule), Some(dispatch)) if rule.id() == dispatch.id() => {
            Some((rule, AssignmentSource::Rule))
        }
        (Some(_), Some(dispatch)) => Some((dispatch, AssignmentSource::Dispatch)),
    }
}

impl Assignments {
    /// The shader in effect for `window`, and which assignment supplied it.
    pub fn effective(&self, window: WindowId) -> Option<(&Rc<ShaderVariant>, AssignmentSource)> {
        effective(
            self.get(AssignmentSource::Rule, window),
            self.get(AssignmentSource::Dispatch, window),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::variant;

    #[test]
    fn follows_precedence_table() {
        let tint = variant("tint", 10);
        let invert = variant("invert", 20);
        let tint_again = variant("tint", 30);

        assert!(effective(None, None).is_none());

        let (chosen, source) = effective(Some(&tint), None).unwrap();
        assert_eq!((chosen.id(), source), ("tint", AssignmentSource::Rule));

        let (chosen, source) = effective(None, Some(&invert)).unwrap();
        assert_eq!((chosen.id(), source), ("invert", AssignmentSource::Dispatch));

        let (chosen, source) = effective(Some(&tint), Some(&tint_again)).unwrap();
        assert!(Rc::ptr_eq(chosen, &tint));
        assert_eq!(source, AssignmentSource::Rule);

        let (chosen, source) = effective(Some(&tint), Some(&invert)).unwrap();
        assert_eq!((chosen.id(), source), ("invert", AssignmentSource::Dispatch));
    }

    #[test]
    fn dispatch_removal_falls_back_to_rule() {
        let window = WindowId(1);
        let mut assignments = Assignments::new();
        assignments.set(AssignmentSource::Rule, window, variant("tint", 10));
        assignments.set(AssignmentSource::Dispatch, window, variant("invert", 20));
        assert_eq!(assignments.effective(window).unwrap().0.id(), "invert");

        assignments.remove(AssignmentSource::Dispatch, window);
        assert_eq!(assignments.effective(window).unwrap().0.id(), "tint");

        assignments.forget(window);
        assert!(assignments.effective(window).is_none());
        assert!(assignments.is_empty());
    }
}
