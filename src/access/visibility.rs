//! Visibility predicate

use crate::head::FileHead;
use crate::identity::Caller;

/// Whether `caller` may see `head`.
///
/// Visible when any of these hold:
/// - the caller's role has full view
/// - the file is public
/// - the caller owns the file
/// - the caller holds a grant and the file is not deleted
pub fn is_visible(head: &FileHead, caller: &Caller, has_grant: bool) -> bool {
    caller.capabilities.full_view()
        || !head.private
        || head.is_owned_by(caller.user_id)
        || (has_grant && !head.deleted)
}
