//! Argument-tuple erasure and typed handler adaptation.
//!
//! [`ArgTuple`] is implemented for tuples of arity 0 through 9. It is
//! the bridge from a typed call site (`publish(key, (10, "x".into()))`)
//! to the erased dispatch plumbing: the tuple knows its [`Signature`]
//! and how to dissolve itself into a [`Payload`].
//!
//! [`PayloadFn`] is the reverse bridge: it is implemented for any
//! closure whose parameters are `&mut` references to the tuple's
//! element types, and re-types an erased payload back into a call to
//! that closure. `invoke` returns `None` when a slot's runtime type
//! does not match the closure's expectation; engines check the
//! signature first, so in practice this only guards internal
//! bookkeeping mistakes.
//!
//! The arity ceiling is 9; raising it is a matter of one more macro
//! invocation line.

use std::any::{type_name, Any, TypeId};

use crate::{Payload, Signature};

/// A typed argument tuple that can describe and erase itself.
///
/// # Example
///
/// ```
/// use pulse_types::ArgTuple;
///
/// let payload = (1_i32, true).into_payload();
/// assert_eq!(payload.len(), 2);
/// assert_eq!(<(i32, bool)>::arity(), 2);
/// ```
pub trait ArgTuple: 'static {
    /// Number of elements in the tuple.
    fn arity() -> usize;

    /// The tuple's type fingerprint.
    fn signature() -> Signature;

    /// Erases the tuple into an owned payload, one slot per element.
    fn into_payload(self) -> Payload;
}

/// A callable that can be driven by an erased [`Payload`].
///
/// Implemented for closures taking `&mut` references to the element
/// types of `Args` and returning `Out`. The three engine crates pick
/// `Out` per handler role: `()` for listeners and bus handlers,
/// `bool` for validators, `Result` for processors.
pub trait PayloadFn<Args, Out> {
    /// Re-types `payload` and calls the underlying closure.
    ///
    /// Returns `None` without calling it if any slot fails to
    /// downcast to the expected element type.
    fn invoke(&mut self, payload: &mut Payload) -> Option<Out>;
}

impl ArgTuple for () {
    fn arity() -> usize {
        0
    }

    fn signature() -> Signature {
        Signature::from_parts(Vec::new(), Vec::new())
    }

    fn into_payload(self) -> Payload {
        Payload::default()
    }
}

impl<F, Out> PayloadFn<(), Out> for F
where
    F: FnMut() -> Out,
{
    fn invoke(&mut self, _payload: &mut Payload) -> Option<Out> {
        Some(self())
    }
}

macro_rules! impl_arg_tuple {
    ($(($ty:ident, $var:ident)),+) => {
        impl<$($ty: 'static),+> ArgTuple for ($($ty,)+) {
            fn arity() -> usize {
                let names: &[&str] = &[$(stringify!($ty)),+];
                names.len()
            }

            fn signature() -> Signature {
                Signature::from_parts(
                    vec![$(TypeId::of::<$ty>()),+],
                    vec![$(type_name::<$ty>()),+],
                )
            }

            fn into_payload(self) -> Payload {
                #[allow(non_snake_case)]
                let ($($var,)+) = self;
                Payload::from_slots(vec![$(Box::new($var) as Box<dyn Any>),+])
            }
        }

        impl<F, Out, $($ty: 'static),+> PayloadFn<($($ty,)+), Out> for F
        where
            F: FnMut($(&mut $ty),+) -> Out,
        {
            fn invoke(&mut self, payload: &mut Payload) -> Option<Out> {
                let mut slots = payload.slots_mut();
                $(let $var = slots.next()?.downcast_mut::<$ty>()?;)+
                Some(self($($var),+))
            }
        }
    };
}

impl_arg_tuple!((A0, a0));
impl_arg_tuple!((A0, a0), (A1, a1));
impl_arg_tuple!((A0, a0), (A1, a1), (A2, a2));
impl_arg_tuple!((A0, a0), (A1, a1), (A2, a2), (A3, a3));
impl_arg_tuple!((A0, a0), (A1, a1), (A2, a2), (A3, a3), (A4, a4));
impl_arg_tuple!((A0, a0), (A1, a1), (A2, a2), (A3, a3), (A4, a4), (A5, a5));
impl_arg_tuple!(
    (A0, a0),
    (A1, a1),
    (A2, a2),
    (A3, a3),
    (A4, a4),
    (A5, a5),
    (A6, a6)
);
impl_arg_tuple!(
    (A0, a0),
    (A1, a1),
    (A2, a2),
    (A3, a3),
    (A4, a4),
    (A5, a5),
    (A6, a6),
    (A7, a7)
);
impl_arg_tuple!(
    (A0, a0),
    (A1, a1),
    (A2, a2),
    (A3, a3),
    (A4, a4),
    (A5, a5),
    (A6, a6),
    (A7, a7),
    (A8, a8)
);
