//! Modbus/TCP batch-read planner (spec §4.4.1) — the hardest adapter
//! logic in the gateway.
//!
//! Per spec.md §9's redesign note, address parsing keys off the
//! caller-supplied function code rather than sniffing the address
//! string's leading digit: each function code implies the Modicon
//! addressing convention's base offset (coils `00001`, discrete inputs
//! `10001`, input registers `30001`, holding registers `40001`), so a
//! device wired for holding registers at `"40001"` and one wired at
//! plain `"1"` both resolve to the same zero-based register offset `0`.
//! Non-numeric address characters are still an `AddressParseError`.

use gw_errors::{GatewayError, Result};

use crate::adapter::AddressSpec;

/// Read function codes, per spec §3 Function group.
const FC_COILS: &str = "01";
const FC_DISCRETE: &str = "02";
const FC_HOLDING: &str = "03";
const FC_INPUT: &str = "04";

const REGISTER_READ_CAP: u32 = 125;
const COIL_READ_CAP: u32 = 2000;

/// One grouped read: a contiguous window of `quantity` words/coils
/// starting at `start`, plus the per-point slice offsets needed to pull
/// each requested point's words back out of the response (spec §4.4.1
/// step 6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadGroup {
    pub start: u16,
    pub quantity: u16,
    /// `(point_id, offset_within_group, span_in_words)`, in the same
    /// order the points were supplied.
    pub members: Vec<(String, u16, u16)>,
}

struct Parsed {
    point_id: String,
    start: u32,
    span: u32,
}

fn base_offset(function: &str) -> u32 {
    match function {
        FC_COILS => 1,
        FC_DISCRETE => 10001,
        FC_HOLDING => 40001,
        FC_INPUT => 30001,
        _ => 1,
    }
}

fn is_coil_like(function: &str) -> bool {
    matches!(function, FC_COILS | FC_DISCRETE)
}

/// §4.4.1 step 1: parses one address string into a zero-based offset.
/// Accepts either the bare Modicon-convention number (`"40001"`) or a
/// plain zero/one-based offset (`"0"`, `"1"`) — whichever the device's
/// point table was authored with — uniformly as digits; anything else
/// is an `AddressParseError`.
fn parse_address(address: &str, function: &str) -> Result<u32> {
    let addr: u32 = address
        .trim()
        .parse()
        .map_err(|_| GatewayError::address_parse(format!("non-numeric Modbus address `{address}`")))?;

    let base = base_offset(function);
    Ok(if addr >= base { addr - base } else { addr.saturating_sub(1) })
}

/// Public entry point for single-point writes (spec §4.4.1's write
/// support), which has no function-group context of its own: resolves
/// against the holding-register convention for numeric/integer writes
/// and the coil convention for boolean writes, the same base-offset
/// normalization `plan_groups` applies to reads.
pub fn parse_write_address(address: &str, is_coil: bool) -> Result<u16> {
    let function = if is_coil { FC_COILS } else { FC_HOLDING };
    let offset = parse_address(address, function)?;
    u16::try_from(offset).map_err(|_| GatewayError::address_parse(format!("Modbus address `{address}` out of u16 range")))
}

/// §4.4.1 steps 1-6: parses, computes spans, sorts, and groups `points`
/// into contiguous read windows for `function`.
pub fn plan_groups(function: &str, points: &[AddressSpec]) -> Result<Vec<ReadGroup>> {
    let mut parsed = Vec::with_capacity(points.len());
    for p in points {
        let start = parse_address(&p.address, function)?;
        let span = if is_coil_like(function) {
            1
        } else {
            p.word_width.max(1) as u32
        };
        parsed.push(Parsed {
            point_id: p.point_id.clone(),
            start,
            span,
        });
    }

    parsed.sort_by_key(|p| p.start);

    let cap = if is_coil_like(function) { COIL_READ_CAP } else { REGISTER_READ_CAP };
    let strict_adjacency = is_coil_like(function);

    let mut groups: Vec<ReadGroup> = Vec::new();
    let mut cur_start: Option<u32> = None;
    let mut cur_max_addr: u32 = 0;
    let mut cur_members: Vec<(String, u32, u32)> = Vec::new();

    for p in parsed {
        // Registers: any gap is acceptable as long as the resulting
        // window stays under the cap — one read still covers the
        // unused registers in between more cheaply than two reads
        // (spec §8 scenario 2: a gap of width 2 or 3 still merges).
        // Coils/discrete inputs require strict adjacency (spec §4.4.1
        // step 4): nothing "in between" can be silently over-read.
        let fits = match cur_start {
            None => true,
            Some(group_start) => {
                let adjacency_ok = !strict_adjacency || p.start == cur_max_addr + 1;
                let span_ok = p.start + p.span - group_start < cap;
                adjacency_ok && span_ok
            }
        };

        if !fits {
            flush_group(&mut groups, cur_start.take(), &mut cur_members);
        }

        if cur_start.is_none() {
            cur_start = Some(p.start);
        }
        cur_max_addr = cur_max_addr.max(p.start);
        cur_members.push((p.point_id, p.start, p.span));
    }
    flush_group(&mut groups, cur_start, &mut cur_members);

    Ok(groups)
}

fn flush_group(groups: &mut Vec<ReadGroup>, start: Option<u32>, members: &mut Vec<(String, u32, u32)>) {
    let Some(start) = start else { return };
    if members.is_empty() {
        return;
    }
    let max_end = members.iter().map(|(_, addr, span)| addr + span).max().unwrap_or(start);
    let quantity = (max_end - start) as u16;
    let out_members = members
        .drain(..)
        .map(|(id, addr, span)| (id, (addr - start) as u16, span as u16))
        .collect();
    groups.push(ReadGroup {
        start: start as u16,
        quantity,
        members: out_members,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: &str, address: &str, word_width: usize) -> AddressSpec {
        AddressSpec {
            point_id: id.to_string(),
            address: address.to_string(),
            word_width,
        }
    }

    #[test]
    fn literal_scenario_single_group_covering_gap() {
        // spec §8 scenario 2: [40001, 40002, 40005] each 1 word -> one
        // read (start=0, quantity=5).
        let points = vec![
            spec("a", "40001", 1),
            spec("b", "40002", 1),
            spec("c", "40005", 1),
        ];
        let groups = plan_groups(FC_HOLDING, &points).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].start, 0);
        assert_eq!(groups[0].quantity, 5);
    }

    #[test]
    fn gap_of_width_two_still_merges_when_under_cap() {
        let points = vec![spec("a", "40001", 1), spec("b", "40004", 1)];
        let groups = plan_groups(FC_HOLDING, &points).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].quantity, 4);
    }

    #[test]
    fn register_groups_never_exceed_125() {
        let points: Vec<AddressSpec> = (0..300)
            .map(|i| spec(&format!("p{i}"), &(40001 + i).to_string(), 1))
            .collect();
        let groups = plan_groups(FC_HOLDING, &points).unwrap();
        for g in &groups {
            assert!(g.quantity as u32 <= REGISTER_READ_CAP, "group {g:?} exceeds cap");
        }
        // every point accounted for
        let total: usize = groups.iter().map(|g| g.members.len()).sum();
        assert_eq!(total, 300);
    }

    #[test]
    fn coil_groups_require_strict_adjacency_and_cap_2000() {
        let points = vec![spec("a", "00001", 1), spec("b", "00003", 1)];
        // gap of 1 -> not strictly adjacent, must split into two groups
        let groups = plan_groups(FC_COILS, &points).unwrap();
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn multi_word_point_spans_are_reflected_in_quantity() {
        // Float points need 2 words each.
        let points = vec![spec("a", "40001", 2), spec("b", "40003", 2)];
        let groups = plan_groups(FC_HOLDING, &points).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].quantity, 4);
        assert_eq!(groups[0].members[1].1, 2); // offset within group
    }

    #[test]
    fn non_numeric_address_is_a_parse_error() {
        let points = vec![spec("a", "40xyz", 1)];
        let err = plan_groups(FC_HOLDING, &points).unwrap_err();
        assert!(matches!(err, GatewayError::AddressParse(_)));
    }

    #[test]
    fn plain_offsets_resolve_the_same_as_modicon_convention() {
        let a = parse_address("40001", FC_HOLDING).unwrap();
        let b = parse_address("0", FC_HOLDING).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn write_address_uses_the_same_base_offset_as_reads() {
        // a linkage write to "40010" must land on the same zero-based
        // register the planner would read at, not raw register 40010.
        assert_eq!(parse_write_address("40010", false).unwrap(), 9);
        assert_eq!(parse_write_address("00010", true).unwrap(), 9);
    }
}
