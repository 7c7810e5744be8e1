// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canned query documents used across the test suites.

use stubwire_core::Request;
use stubwire_doc::{Document, Field, OperationDefinition, OperationKind, TypeRef, Value};

/// The user-info query:
///
/// ```graphql
/// query UserInfo($name: String) {
///   user(name: $name) {
///     name
///   }
/// }
/// ```
pub fn user_info_query() -> Document {
    Document::operation(
        OperationDefinition::new(OperationKind::Query, Some("UserInfo"))
            .variable("name", TypeRef::named("String"))
            .select(
                Field::new("user")
                    .argument("name", Value::variable("name"))
                    .select(Field::new("name")),
            ),
    )
}

/// [`user_info_query`] bound to `name`.
///
/// # Example
///
/// ```
/// use stubwire_dry_tests::user_info_request;
///
/// let req = user_info_request("Changping Chen");
/// assert_eq!(req.variables["name"], "Changping Chen");
/// assert!(!req.normalize_shape);
/// ```
pub fn user_info_request(name: &str) -> Request {
    Request::new(user_info_query()).variable("name", name)
}

/// `subscription OnUser($name: String) { userChanged(name: $name) { name } }`
pub fn user_subscription() -> Document {
    Document::operation(
        OperationDefinition::new(OperationKind::Subscription, Some("OnUser"))
            .variable("name", TypeRef::named("String"))
            .select(
                Field::new("userChanged")
                    .argument("name", Value::variable("name"))
                    .select(Field::new("name")),
            ),
    )
}

/// Shorthand `{ hello }` query.
pub fn hello_query() -> Document {
    Document::operation(
        OperationDefinition::new(OperationKind::Query, None).select(Field::new("hello")),
    )
}
