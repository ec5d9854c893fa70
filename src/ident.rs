// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use once_cell::sync::Lazy;
use uuid::Uuid;

static NAMESPACE: Lazy<Uuid> =
    Lazy::new(|| Uuid::new_v5(&Uuid::NAMESPACE_DNS, b"feeledger.migration"));

/// Deterministic identifier for a migrated row: same kind and key parts
/// always produce the same UUID, so re-running the migration is idempotent.
///
/// The unit separator cannot occur in legacy keys, so distinct part lists
/// never collide on the joined form.
pub fn stable_id(kind: &str, parts: &[&str]) -> Uuid {
    let mut key = String::from(kind);
    for p in parts {
        key.push('\u{1f}');
        key.push_str(p);
    }
    Uuid::new_v5(&NAMESPACE, key.as_bytes())
}
