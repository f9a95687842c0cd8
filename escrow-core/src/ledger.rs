//! Escrow ledger: investor records, purchaser log, withdrawable credits
//!
//! Pure bookkeeping with no knowledge of the deal state machine. Every
//! mutator either commits completely or returns an error having changed
//! nothing: multi-entry updates are computed in full before any balance is
//! written.

use crate::types::{Address, TokenAmount};
use crate::{Error, Result};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Fund bookkeeping for one deal
#[derive(Debug, Clone, Default)]
pub struct EscrowLedger {
    /// Investors in first-contribution order, append-only
    investors: Vec<Address>,

    /// Cumulative contribution per investor
    contributions: HashMap<Address, TokenAmount>,

    /// Successful purchasers in call order; duplicates are legal
    purchasers: Vec<Address>,

    /// Withdrawable credit per address (pull payments)
    withdrawable: HashMap<Address, TokenAmount>,

    /// Sum of all outstanding contributions
    invested: TokenAmount,

    /// Rounding remainders kept by the deal
    retained: TokenAmount,
}

impl EscrowLedger {
    /// Empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of outstanding contributions
    pub fn invested(&self) -> TokenAmount {
        self.invested
    }

    /// Rounding remainders kept by the deal
    pub fn retained(&self) -> TokenAmount {
        self.retained
    }

    /// Investors in first-contribution order
    pub fn investors(&self) -> &[Address] {
        &self.investors
    }

    /// Purchasers in call order, duplicates possible
    pub fn purchasers(&self) -> &[Address] {
        &self.purchasers
    }

    /// True when the address has ever contributed
    pub fn is_investor(&self, addr: &Address) -> bool {
        self.contributions.contains_key(addr)
    }

    /// Outstanding contribution of an address
    pub fn contribution_of(&self, addr: &Address) -> TokenAmount {
        self.contributions
            .get(addr)
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }

    /// Withdrawable credit of an address
    pub fn withdrawable_of(&self, addr: &Address) -> TokenAmount {
        self.withdrawable
            .get(addr)
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }

    /// Record a contribution, appending to the investor list only on the
    /// first one; zero amounts change nothing
    pub fn record_contribution(&mut self, addr: &Address, amount: TokenAmount) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let new_invested = self
            .invested
            .checked_add(amount)
            .ok_or(Error::Overflow("invested total"))?;

        match self.contributions.entry(addr.clone()) {
            Entry::Occupied(mut entry) => {
                let updated = entry
                    .get()
                    .checked_add(amount)
                    .ok_or(Error::Overflow("investor contribution"))?;
                entry.insert(updated);
            }
            Entry::Vacant(entry) => {
                entry.insert(amount);
                self.investors.push(addr.clone());
            }
        }
        self.invested = new_invested;
        Ok(())
    }

    /// Append a purchaser to the log
    pub fn record_purchaser(&mut self, addr: &Address) {
        self.purchasers.push(addr.clone());
    }

    /// Add withdrawable credit to an address
    pub fn credit(&mut self, addr: &Address, amount: TokenAmount) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let updated = self
            .withdrawable_of(addr)
            .checked_add(amount)
            .ok_or(Error::Overflow("withdrawable credit"))?;
        self.withdrawable.insert(addr.clone(), updated);
        Ok(())
    }

    /// Take the full withdrawable credit of an address, zeroing it
    pub fn take_credit(&mut self, addr: &Address) -> TokenAmount {
        self.withdrawable
            .remove(addr)
            .unwrap_or(TokenAmount::ZERO)
    }

    /// Move every outstanding contribution into withdrawable credits and
    /// zero the escrow
    ///
    /// Returns the refund schedule in investor order.
    pub fn refund_all(&mut self) -> Result<Vec<(Address, TokenAmount)>> {
        // Validate every credit before writing any.
        let mut updates = Vec::with_capacity(self.investors.len());
        for addr in &self.investors {
            let contribution = self.contribution_of(addr);
            if contribution.is_zero() {
                continue;
            }
            let new_credit = self
                .withdrawable_of(addr)
                .checked_add(contribution)
                .ok_or(Error::Overflow("refund credit"))?;
            updates.push((addr.clone(), contribution, new_credit));
        }

        let mut refunds = Vec::with_capacity(updates.len());
        for (addr, contribution, new_credit) in updates {
            self.withdrawable.insert(addr.clone(), new_credit);
            self.contributions.insert(addr.clone(), TokenAmount::ZERO);
            refunds.push((addr, contribution));
        }
        self.invested = TokenAmount::ZERO;
        Ok(refunds)
    }

    /// Split `total` across investors proportionally to their contributions
    /// using floor division, crediting withdrawable balances; the rounding
    /// remainder is retained
    ///
    /// Returns the payout schedule in investor order plus the remainder.
    pub fn distribute(
        &mut self,
        total: TokenAmount,
    ) -> Result<(Vec<(Address, TokenAmount)>, TokenAmount)> {
        // Compute every share and resulting balance before writing any.
        let mut updates = Vec::with_capacity(self.investors.len());
        let mut distributed = TokenAmount::ZERO;
        for addr in &self.investors {
            let contribution = self.contribution_of(addr);
            let share = TokenAmount::floor_share(total, contribution, self.invested)
                .ok_or(Error::Overflow("distribution share"))?;
            distributed = distributed
                .checked_add(share)
                .ok_or(Error::Overflow("distribution total"))?;
            let new_credit = self
                .withdrawable_of(addr)
                .checked_add(share)
                .ok_or(Error::Overflow("distribution credit"))?;
            updates.push((addr.clone(), share, new_credit));
        }
        let remainder = total
            .checked_sub(distributed)
            .ok_or(Error::Overflow("distribution remainder"))?;
        let new_retained = self
            .retained
            .checked_add(remainder)
            .ok_or(Error::Overflow("retained remainder"))?;

        let mut payouts = Vec::with_capacity(updates.len());
        for (addr, share, new_credit) in updates {
            if !share.is_zero() {
                self.withdrawable.insert(addr.clone(), new_credit);
            }
            payouts.push((addr, share));
        }
        self.retained = new_retained;
        Ok((payouts, remainder))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(tag: u8) -> Address {
        Address::new(vec![0x00, tag])
    }

    #[test]
    fn test_first_contribution_order_no_duplicates() {
        let mut ledger = EscrowLedger::new();
        ledger.record_contribution(&addr(1), TokenAmount::new(10)).unwrap();
        ledger.record_contribution(&addr(2), TokenAmount::new(20)).unwrap();
        ledger.record_contribution(&addr(1), TokenAmount::new(5)).unwrap();

        assert_eq!(ledger.investors(), &[addr(1), addr(2)]);
        assert_eq!(ledger.contribution_of(&addr(1)), TokenAmount::new(15));
        assert_eq!(ledger.invested(), TokenAmount::new(35));
    }

    #[test]
    fn test_zero_contribution_creates_no_record() {
        let mut ledger = EscrowLedger::new();
        ledger.record_contribution(&addr(1), TokenAmount::ZERO).unwrap();
        assert!(ledger.investors().is_empty());
        assert!(!ledger.is_investor(&addr(1)));
    }

    #[test]
    fn test_refund_all_moves_contributions_to_credits() {
        let mut ledger = EscrowLedger::new();
        ledger.record_contribution(&addr(1), TokenAmount::new(50)).unwrap();
        ledger.record_contribution(&addr(2), TokenAmount::new(40)).unwrap();

        let refunds = ledger.refund_all().unwrap();
        assert_eq!(
            refunds,
            vec![
                (addr(1), TokenAmount::new(50)),
                (addr(2), TokenAmount::new(40))
            ]
        );
        assert_eq!(ledger.invested(), TokenAmount::ZERO);
        assert_eq!(ledger.withdrawable_of(&addr(1)), TokenAmount::new(50));
        assert_eq!(ledger.withdrawable_of(&addr(2)), TokenAmount::new(40));
        // Records survive refund: the list is append-only history
        assert_eq!(ledger.investors().len(), 2);
        assert!(ledger.is_investor(&addr(1)));
    }

    #[test]
    fn test_distribute_floor_and_remainder() {
        let mut ledger = EscrowLedger::new();
        ledger.record_contribution(&addr(1), TokenAmount::new(1)).unwrap();
        ledger.record_contribution(&addr(2), TokenAmount::new(1)).unwrap();
        ledger.record_contribution(&addr(3), TokenAmount::new(1)).unwrap();

        let (payouts, remainder) = ledger.distribute(TokenAmount::new(100)).unwrap();
        // floor(100/3) = 33 each, remainder 1
        for (_, share) in &payouts {
            assert_eq!(*share, TokenAmount::new(33));
        }
        assert_eq!(remainder, TokenAmount::new(1));
        assert_eq!(ledger.retained(), TokenAmount::new(1));
        assert_eq!(ledger.withdrawable_of(&addr(1)), TokenAmount::new(33));
    }

    #[test]
    fn test_distribute_accumulates_credits() {
        let mut ledger = EscrowLedger::new();
        ledger.record_contribution(&addr(1), TokenAmount::new(50)).unwrap();
        ledger.record_contribution(&addr(2), TokenAmount::new(50)).unwrap();

        ledger.distribute(TokenAmount::new(100)).unwrap();
        ledger.distribute(TokenAmount::new(100)).unwrap();
        assert_eq!(ledger.withdrawable_of(&addr(1)), TokenAmount::new(100));
        assert_eq!(ledger.withdrawable_of(&addr(2)), TokenAmount::new(100));
    }

    #[test]
    fn test_take_credit_zeroes() {
        let mut ledger = EscrowLedger::new();
        ledger.credit(&addr(1), TokenAmount::new(30)).unwrap();
        assert_eq!(ledger.take_credit(&addr(1)), TokenAmount::new(30));
        assert_eq!(ledger.take_credit(&addr(1)), TokenAmount::ZERO);
    }

    #[test]
    fn test_distribute_with_zero_invested_fails_cleanly() {
        let mut ledger = EscrowLedger::new();
        ledger.record_contribution(&addr(1), TokenAmount::new(10)).unwrap();
        ledger.refund_all().unwrap();
        // Investor records remain but invested is zero; shares are undefined
        assert!(ledger.distribute(TokenAmount::new(10)).is_err());
    }
}
