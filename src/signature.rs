//! Service method signatures.
//!
//! | Streaming | Callback style | Iterator style |
//! |-----------|----------------|----------------|
//! | none | `(request: In): Out` | same |
//! | server | `(request: In, onEach: (item: Out) => void): void` | `(request: In): AsyncIterator<Out>` |
//! | client | `(nextRequest: () => { value: In, done: boolean }): Out` | `(requests: AsyncIterator<In>): Out` |
//! | both | `(nextRequest: ..., onEach: ...): void` | `(requests: AsyncIterator<In>): AsyncIterator<Out>` |

use serde::Serialize;

use crate::schema::Method;
use crate::type_map::{Member, Scalar, TypeExpr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Streaming {
    Unary,
    Server,
    Client,
    Bidirectional,
}

impl Streaming {
    pub fn of(method: &Method) -> Self {
        match (method.client_streaming, method.server_streaming) {
            (false, false) => Self::Unary,
            (false, true) => Self::Server,
            (true, false) => Self::Client,
            (true, true) => Self::Bidirectional,
        }
    }
}

/// A method ready for rendering: name, parameters and return type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub name: String,
    pub params: Vec<Member>,
    pub returns: TypeExpr,
}

/// Build the signature of `method` from its already-resolved input and
/// output types.
pub fn build_signature(
    method: &Method,
    input: TypeExpr,
    output: TypeExpr,
    async_iterators: bool,
) -> Signature {
    let streaming = Streaming::of(method);
    let (params, returns) = if async_iterators {
        iterator_style(streaming, input, output)
    } else {
        callback_style(streaming, input, output)
    };
    Signature {
        name: method.name.clone(),
        params,
        returns,
    }
}

fn iterator_style(streaming: Streaming, input: TypeExpr, output: TypeExpr) -> (Vec<Member>, TypeExpr) {
    let iter = |ty| TypeExpr::Iterator(Box::new(ty));
    match streaming {
        Streaming::Unary => (vec![Member::required("request", input)], output),
        Streaming::Server => (vec![Member::required("request", input)], iter(output)),
        Streaming::Client => (vec![Member::required("requests", iter(input))], output),
        Streaming::Bidirectional => (
            vec![Member::required("requests", iter(input))],
            iter(output),
        ),
    }
}

fn callback_style(streaming: Streaming, input: TypeExpr, output: TypeExpr) -> (Vec<Member>, TypeExpr) {
    let void = TypeExpr::Primitive(Scalar::Void);
    match streaming {
        Streaming::Unary => (vec![Member::required("request", input)], output),
        Streaming::Server => (
            vec![
                Member::required("request", input),
                Member::required("onEach", on_each(output)),
            ],
            void,
        ),
        Streaming::Client => (vec![Member::required("nextRequest", next_request(input))], output),
        Streaming::Bidirectional => (
            vec![
                Member::required("nextRequest", next_request(input)),
                Member::required("onEach", on_each(output)),
            ],
            void,
        ),
    }
}

/// `(item: Out) => void`
fn on_each(output: TypeExpr) -> TypeExpr {
    TypeExpr::Function {
        params: vec![Member::required("item", output)],
        returns: Box::new(TypeExpr::Primitive(Scalar::Void)),
    }
}

/// `() => { value: In, done: boolean }`
fn next_request(input: TypeExpr) -> TypeExpr {
    TypeExpr::Function {
        params: Vec::new(),
        returns: Box::new(TypeExpr::Object(vec![
            Member::required("value", input),
            Member::required("done", TypeExpr::Primitive(Scalar::Boolean)),
        ])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Target;
    use crate::names::QualifiedName;
    use crate::schema::{Comments, MessageId};
    use crate::target::for_target;

    fn method(client_streaming: bool, server_streaming: bool) -> Method {
        Method {
            name: "Search".to_string(),
            input: MessageId::default(),
            output: MessageId::default(),
            client_streaming,
            server_streaming,
            comments: Comments::default(),
        }
    }

    fn named(name: &str) -> TypeExpr {
        TypeExpr::Named(QualifiedName {
            module: None,
            path: vec![name.to_string()],
        })
    }

    fn render(client: bool, server: bool, async_iterators: bool, target: Target) -> String {
        let sig = build_signature(
            &method(client, server),
            named("SearchRequest"),
            named("SearchResponse"),
            async_iterators,
        );
        for_target(target).method_member(&sig)
    }

    #[test]
    fn unary_ignores_iterator_mode() {
        let expected = "Search(request: SearchRequest): SearchResponse;";
        assert_eq!(render(false, false, false, Target::TypeScript), expected);
        assert_eq!(render(false, false, true, Target::TypeScript), expected);
    }

    #[test]
    fn server_streaming() {
        assert_eq!(
            render(false, true, false, Target::TypeScript),
            "Search(request: SearchRequest, onEach: (item: SearchResponse) => void): void;"
        );
        assert_eq!(
            render(false, true, true, Target::TypeScript),
            "Search(request: SearchRequest): AsyncIterator<SearchResponse>;"
        );
    }

    #[test]
    fn client_streaming() {
        assert_eq!(
            render(true, false, false, Target::TypeScript),
            "Search(nextRequest: () => { value: SearchRequest, done: boolean }): SearchResponse;"
        );
        assert_eq!(
            render(true, false, true, Target::TypeScript),
            "Search(requests: AsyncIterator<SearchRequest>): SearchResponse;"
        );
    }

    #[test]
    fn bidirectional_combines_both_sides() {
        assert_eq!(
            render(true, true, false, Target::TypeScript),
            "Search(nextRequest: () => { value: SearchRequest, done: boolean }, \
             onEach: (item: SearchResponse) => void): void;"
        );
        assert_eq!(
            render(true, true, true, Target::TypeScript),
            "Search(requests: AsyncIterator<SearchRequest>): AsyncIterator<SearchResponse>;"
        );
    }

    #[test]
    fn elm_signatures_are_curried() {
        assert_eq!(
            render(false, false, false, Target::Elm),
            "search : SearchRequest -> SearchResponse"
        );
        assert_eq!(
            render(false, true, false, Target::Elm),
            "search : SearchRequest -> (SearchResponse -> ()) -> ()"
        );
        assert_eq!(
            render(true, false, false, Target::Elm),
            "search : (() -> { value : SearchRequest, done : Bool }) -> SearchResponse"
        );
    }

    #[test]
    fn streaming_kind() {
        assert_eq!(Streaming::of(&method(false, false)), Streaming::Unary);
        assert_eq!(Streaming::of(&method(true, true)), Streaming::Bidirectional);
    }
}
