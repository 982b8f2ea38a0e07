//! Local rule engine used when the remote decision service is unavailable.
//!
//! Rules are evaluated in order and the first match wins:
//! 1. admin principals (`admin` substring, case-insensitive) are allowed
//! 2. `game::*` actions
//! 3. `profile::*` actions (owner-only)
//! 4. everything else is denied
//!
//! Missing context never fails evaluation; it resolves to the defaults below.

use crate::context::{keys, AuthContext};
use crate::decision::{AuthorizationRequest, AuthorizationResult};

const DEFAULT_AGE: f64 = 18.0;
const DEFAULT_RATING: &str = "E";
const MATURE_RATINGS: [&str; 2] = ["M", "AO"];
const MATURE_MIN_AGE: f64 = 17.0;

const GAME_NS: &str = "game::";
const PROFILE_NS: &str = "profile::";
const NS_SEP: &str = "::";

/// Evaluate the fallback rules. Total and deterministic.
pub fn evaluate(req: &AuthorizationRequest) -> AuthorizationResult {
    let result = if is_admin(&req.principal) {
        AuthorizationResult::fallback_allow("Admin user access")
    } else if req.action.starts_with(GAME_NS) {
        game_rule(&req.action, &req.context)
    } else if req.action.starts_with(PROFILE_NS) {
        profile_rule(&req.principal, &req.resource)
    } else {
        no_policy(&req.action)
    };

    tracing::trace!(
        principal = %req.principal,
        action = %req.action,
        allowed = result.allowed,
        reason = %result.reason,
        "fallback rule evaluated"
    );
    result
}

/// Admin detection shared by the admin and profile rules.
pub fn is_admin(principal: &str) -> bool {
    principal.to_lowercase().contains("admin")
}

/// Owner segment of a `prefix::owner` resource (whole resource without separator).
pub fn resource_owner(resource: &str) -> &str {
    resource.rsplit(NS_SEP).next().unwrap_or(resource)
}

fn game_rule(action: &str, ctx: &AuthContext) -> AuthorizationResult {
    match action {
        "game::view" => AuthorizationResult::fallback_allow("Game viewing allowed for all users"),
        "game::purchase" => purchase_rule(ctx),
        "game::download" | "game::wishlist" => {
            AuthorizationResult::fallback_allow(format!("Action {action} allowed"))
        }
        // unhandled game actions stay deny-by-default
        _ => no_policy(action),
    }
}

fn purchase_rule(ctx: &AuthContext) -> AuthorizationResult {
    let rating = ctx.text(keys::GAME_RATING).unwrap_or(DEFAULT_RATING);
    let age = ctx.number(keys::AGE).unwrap_or(DEFAULT_AGE);

    if MATURE_RATINGS.contains(&rating) && age < MATURE_MIN_AGE {
        return AuthorizationResult::fallback_deny(
            "Age restriction: User too young for mature content",
        );
    }

    let balance = ctx.number(keys::ACCOUNT_BALANCE).unwrap_or(0.0);
    let price = ctx.number(keys::GAME_PRICE).unwrap_or(0.0);
    if balance < price {
        return AuthorizationResult::fallback_deny("Insufficient account balance");
    }

    AuthorizationResult::fallback_allow("Purchase authorized")
}

fn profile_rule(principal: &str, resource: &str) -> AuthorizationResult {
    if principal == resource_owner(resource) || is_admin(principal) {
        AuthorizationResult::fallback_allow("Profile access authorized")
    } else {
        AuthorizationResult::fallback_deny("Can only access own profile")
    }
}

fn no_policy(action: &str) -> AuthorizationResult {
    AuthorizationResult::fallback_deny(format!("No policy found for action {action}"))
}
