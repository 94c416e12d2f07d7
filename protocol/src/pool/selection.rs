//! Eligibility and selection.
//!
//! Both balance computation and transfer selection go through the same
//! [`evaluate`] predicate, so "what counts toward the balance" and "what may
//! be spent" can never disagree.
//!
//! [`plan_selection`] is pure: given the same candidate values and amount it
//! always picks the same assets. Smallest first, ties broken by address,
//! stop as soon as the running total covers the amount. Spending small
//! assets first keeps pools from fragmenting into dust.

use ed25519_dalek::VerifyingKey;
use std::fmt;

use super::binding::binding_is_valid;
use crate::store::{Asset, AssetAddressIndex};

/// A source asset together with its pool index entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub asset: Asset,
    pub index: AssetAddressIndex,
}

/// Why a candidate was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligible {
    ZeroValue,
    AssetSpent,
    IndexSpent,
    IndexMismatch,
    TypeMismatch,
    PoolMismatch,
    BindingInvalid,
}

impl fmt::Display for Ineligible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Ineligible::ZeroValue => "zero value",
            Ineligible::AssetSpent => "asset already spent",
            Ineligible::IndexSpent => "index entry already spent",
            Ineligible::IndexMismatch => "index entry belongs to another asset",
            Ineligible::TypeMismatch => "asset type mismatch",
            Ineligible::PoolMismatch => "index entry belongs to another pool",
            Ineligible::BindingInvalid => "binding signature does not verify",
        };
        f.write_str(reason)
    }
}

/// The one eligibility predicate.
///
/// `minter_key` is `None` when the minter is unknown or its key does not
/// parse; such assets can never be spent.
pub fn evaluate(
    candidate: &Candidate,
    pool_id: &str,
    asset_type_id: &str,
    minter_key: Option<&VerifyingKey>,
) -> Result<(), Ineligible> {
    let Candidate { asset, index } = candidate;
    if asset.value == 0 {
        return Err(Ineligible::ZeroValue);
    }
    if asset.spent {
        return Err(Ineligible::AssetSpent);
    }
    if index.spent {
        return Err(Ineligible::IndexSpent);
    }
    if index.pool_id != pool_id {
        return Err(Ineligible::PoolMismatch);
    }
    if asset.index_id != index.encrypted_address {
        return Err(Ineligible::IndexMismatch);
    }
    if asset.asset_type_id != asset_type_id || index.asset_type_id != asset_type_id {
        return Err(Ineligible::TypeMismatch);
    }
    match minter_key {
        Some(key) if binding_is_valid(asset, pool_id, key) => Ok(()),
        _ => Err(Ineligible::BindingInvalid),
    }
}

/// The chosen inputs for a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPlan {
    /// Indices into the input slice, in consumption order.
    pub selected: Vec<usize>,
    /// Sum of the selected values.
    pub consumed: u128,
    /// `consumed - amount`. Always smaller than the largest selected value,
    /// so it fits a `u64`.
    pub change: u64,
}

/// Eligible total fell short of the requested amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub available: u128,
    pub requested: u64,
}

/// Pick inputs covering `amount` from `(address, value)` pairs.
pub fn plan_selection(inputs: &[(&str, u64)], amount: u64) -> Result<SelectionPlan, Shortfall> {
    let mut order: Vec<usize> = (0..inputs.len()).collect();
    order.sort_by(|&a, &b| {
        let (addr_a, value_a) = inputs[a];
        let (addr_b, value_b) = inputs[b];
        value_a.cmp(&value_b).then_with(|| addr_a.cmp(addr_b))
    });

    let target = u128::from(amount);
    let mut consumed: u128 = 0;
    let mut selected = Vec::new();
    for i in order {
        if consumed >= target {
            break;
        }
        consumed += u128::from(inputs[i].1);
        selected.push(i);
    }

    if consumed < target {
        return Err(Shortfall {
            available: consumed,
            requested: amount,
        });
    }

    let change = u64::try_from(consumed - target).map_err(|_| Shortfall {
        available: consumed,
        requested: amount,
    })?;
    Ok(SelectionPlan {
        selected,
        consumed,
        change,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SigningKeypair;
    use crate::pool::binding::sign_binding;

    fn candidate(kp: &SigningKeypair, value: u64) -> Candidate {
        Candidate {
            asset: Asset {
                address: "a1".into(),
                value,
                asset_type_id: "USD".into(),
                spent: false,
                sign: sign_binding(kp, "pool1", "a1", "USD"),
                minter: "org1".into(),
                index_id: "enc".into(),
            },
            index: AssetAddressIndex {
                pool_id: "pool1".into(),
                encrypted_address: "enc".into(),
                asset_type_id: "USD".into(),
                spent: false,
            },
        }
    }

    #[test]
    fn test_eligible_candidate() {
        let kp = SigningKeypair::generate();
        let c = candidate(&kp, 10);
        assert_eq!(evaluate(&c, "pool1", "USD", Some(&kp.verifying_key())), Ok(()));
    }

    #[test]
    fn test_each_ineligibility_reason() {
        let kp = SigningKeypair::generate();
        let key = kp.verifying_key();

        let c = candidate(&kp, 0);
        assert_eq!(evaluate(&c, "pool1", "USD", Some(&key)), Err(Ineligible::ZeroValue));

        let mut c = candidate(&kp, 5);
        c.asset.spent = true;
        assert_eq!(evaluate(&c, "pool1", "USD", Some(&key)), Err(Ineligible::AssetSpent));

        let mut c = candidate(&kp, 5);
        c.index.spent = true;
        assert_eq!(evaluate(&c, "pool1", "USD", Some(&key)), Err(Ineligible::IndexSpent));

        let mut c = candidate(&kp, 5);
        c.index.encrypted_address = "enc-of-another-asset".into();
        assert_eq!(evaluate(&c, "pool1", "USD", Some(&key)), Err(Ineligible::IndexMismatch));

        let c = candidate(&kp, 5);
        assert_eq!(evaluate(&c, "pool2", "USD", Some(&key)), Err(Ineligible::PoolMismatch));
        assert_eq!(evaluate(&c, "pool1", "EUR", Some(&key)), Err(Ineligible::TypeMismatch));
        assert_eq!(evaluate(&c, "pool1", "USD", None), Err(Ineligible::BindingInvalid));

        let other = SigningKeypair::generate();
        assert_eq!(
            evaluate(&c, "pool1", "USD", Some(&other.verifying_key())),
            Err(Ineligible::BindingInvalid)
        );
    }

    #[test]
    fn test_smallest_first_with_change() {
        let inputs = [("c", 50), ("a", 30), ("b", 20)];
        let plan = plan_selection(&inputs, 40).unwrap();
        // 20 (b) then 30 (a) = 50 >= 40.
        assert_eq!(plan.selected, vec![2, 1]);
        assert_eq!(plan.consumed, 50);
        assert_eq!(plan.change, 10);
    }

    #[test]
    fn test_exact_cover_has_no_change() {
        let plan = plan_selection(&[("a", 60), ("b", 40)], 100).unwrap();
        assert_eq!(plan.consumed, 100);
        assert_eq!(plan.change, 0);
    }

    #[test]
    fn test_ties_broken_by_address() {
        let plan = plan_selection(&[("z", 10), ("m", 10), ("a", 10)], 15).unwrap();
        assert_eq!(plan.selected, vec![2, 1]);
    }

    #[test]
    fn test_selection_is_order_independent() {
        let forward = [("a", 5), ("b", 7), ("c", 7), ("d", 100)];
        let backward = [("d", 100), ("c", 7), ("b", 7), ("a", 5)];
        let pick = |inputs: &[(&str, u64)]| -> Vec<String> {
            plan_selection(inputs, 12)
                .unwrap()
                .selected
                .iter()
                .map(|&i| inputs[i].0.to_string())
                .collect()
        };
        assert_eq!(pick(&forward), pick(&backward));
    }

    #[test]
    fn test_shortfall() {
        assert_eq!(
            plan_selection(&[("a", 60), ("b", 40)], 150),
            Err(Shortfall {
                available: 100,
                requested: 150
            })
        );
        assert_eq!(
            plan_selection(&[], 1),
            Err(Shortfall {
                available: 0,
                requested: 1
            })
        );
    }

    #[test]
    fn test_large_values_do_not_overflow() {
        let plan = plan_selection(&[("a", u64::MAX), ("b", u64::MAX)], u64::MAX).unwrap();
        assert_eq!(plan.selected.len(), 1);
        assert_eq!(plan.change, 0);

        let plan = plan_selection(&[("a", u64::MAX - 1), ("b", u64::MAX)], u64::MAX).unwrap();
        assert_eq!(plan.consumed, u128::from(u64::MAX - 1) + u128::from(u64::MAX));
        assert_eq!(plan.change, u64::MAX - 1);
    }

    #[test]
    fn test_zero_amount_selects_nothing() {
        let plan = plan_selection(&[("a", 5)], 0).unwrap();
        assert!(plan.selected.is_empty());
        assert_eq!(plan.change, 0);
    }
}
