//! Static route registration and request dispatch.
//!
//! Routes are declared in one explicit list ([`crate::routes::route_defs`]) with the
//! [`route!`] macro and compiled once into a [`RouteTable`] at startup. The
//! [`dispatch`] fallback handler runs the CSRF pre-check, resolves the route, coerces
//! path parameters and invokes a freshly constructed controller.

pub mod dispatch;
pub mod params;
pub mod table;

use std::fmt;

use axum::{extract::Request, response::Response};
use futures::future::BoxFuture;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub use dispatch::dispatch;
pub use params::{FromParam, Param, ParamValue};
pub use table::{CompiledPattern, RouteDef, RouteError, RouteTable};

/// Type-erased controller action: state, the untouched request, and the coerced
/// path parameters in capture order.
pub type Action = fn(AppState, Request, Vec<Param>) -> BoxFuture<'static, AppResult<Response>>;

/// What a route resolves to: owning controller and action names (diagnostics) plus
/// the erased entry point.
#[derive(Clone, Copy)]
pub struct HandlerRef {
    pub owner: &'static str,
    pub action: &'static str,
    pub call: Action,
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.owner, self.action)
    }
}

/// A controller is built fresh for every request it serves; it holds no state
/// between requests beyond what it copies out of [`AppState`].
pub trait Controller: Sized {
    fn new(state: &AppState) -> Self;
}

/// Pops the next positional parameter and converts it. A missing or wrongly typed
/// parameter means the path does not address this action.
pub fn next_arg<T: FromParam>(args: &mut impl Iterator<Item = Param>) -> AppResult<T> {
    args.next()
        .and_then(T::from_param)
        .ok_or_else(|| AppError::NotFound(dispatch::ROUTE_NOT_FOUND.to_string()))
}

/// Declares one route.
///
/// ```ignore
/// route!(GET "/api/articles/id/{id}" => ArticleController::show_by_id(id: i64))
/// ```
///
/// expands to a [`RouteDef`] whose action constructs `ArticleController` via
/// [`Controller::new`] and calls `show_by_id(request, id)` with the captures
/// converted positionally.
macro_rules! route {
    ($method:ident $template:literal => $owner:ident :: $action:ident ( $($arg:ident : $ty:ty),* $(,)? )) => {
        $crate::router::RouteDef {
            method: ::axum::http::Method::$method,
            template: $template,
            handler: $crate::router::HandlerRef {
                owner: stringify!($owner),
                action: stringify!($action),
                call: |state, req, params| {
                    Box::pin(async move {
                        #[allow(unused_mut, unused_variables)]
                        let mut args = params.into_iter();
                        $( let $arg: $ty = $crate::router::next_arg(&mut args)?; )*
                        <$owner as $crate::router::Controller>::new(&state).$action(req $(, $arg)*).await
                    })
                },
            },
        }
    };
}

pub(crate) use route;
