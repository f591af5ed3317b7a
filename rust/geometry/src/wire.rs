// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Oriented chains of 2D curves.
//!
//! A [`Wire`] owns its curves in a slot arena. The string id of each curve is
//! its external handle, and the traversal direction is stored with the curve
//! itself, so reordering the chain never flips a curve.

use crate::bounds::Bounds2;
use crate::curve::Curve2d;
use crate::error::{Error, Result};
use crate::tessellation::{Tessellation, Tolerance};
use nalgebra::{Matrix3, Point2};
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Stable handle of a curve slot inside one wire.
    pub struct CurveKey;
}

/// A curve together with its external id, as handed to [`Wire::set_curves`].
#[derive(Debug, Clone, PartialEq)]
pub struct WireCurve {
    pub id: String,
    pub curve: Curve2d,
}

impl WireCurve {
    pub fn new(id: impl Into<String>, curve: impl Into<Curve2d>) -> Self {
        Self {
            id: id.into(),
            curve: curve.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct CurveSlot {
    id: String,
    curve: Curve2d,
    reversed: bool,
}

/// Role assigned by the face or loop that owns this wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopRole {
    Outer,
    Inner,
}

/// Field names reported through [`WireEvent::FieldChanged`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireField {
    Curves,
    ReverseFlags,
}

/// Notifications for the owning entity. They are queued, not dispatched;
/// the owner collects them with [`Wire::drain_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireEvent {
    ChildAdded(String),
    ChildRemoved(String),
    FieldChanged(WireField),
}

#[derive(Debug)]
pub struct Wire {
    id: String,
    slots: SlotMap<CurveKey, CurveSlot>,
    order: Vec<CurveKey>,
    index: FxHashMap<String, CurveKey>,
    role: Option<LoopRole>,
    events: Vec<WireEvent>,
}

impl Clone for Wire {
    /// Deep copy. Pending events belong to the original and are not copied.
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            slots: self.slots.clone(),
            order: self.order.clone(),
            index: self.index.clone(),
            role: self.role,
            events: Vec::new(),
        }
    }
}

impl Wire {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            slots: SlotMap::with_key(),
            order: Vec::new(),
            index: FxHashMap::default(),
            role: None,
            events: Vec::new(),
        }
    }

    /// Builds a wire from identified curves. No events are queued and all
    /// curves start unreversed; call [`Wire::fix_reverse`] to orient them.
    pub fn create(id: impl Into<String>, curves: Vec<WireCurve>) -> Self {
        let mut wire = Self::new(id);
        wire.set_curves(curves, false);
        wire.events.clear();
        wire
    }

    /// Builds a wire from bare curves, naming them `<wire id>/<position>`,
    /// and orients the chain. Disconnected input is kept as is and reported
    /// by [`Wire::verify`].
    pub fn from_curves(id: impl Into<String>, curves: Vec<Curve2d>) -> Self {
        let id = id.into();
        let named = curves
            .into_iter()
            .enumerate()
            .map(|(i, c)| WireCurve::new(format!("{}/{}", id, i), c))
            .collect();
        let mut wire = Self::create(id, named);
        if wire.len() > 1 {
            if let Err(e) = wire.fix_reverse() {
                tracing::debug!(wire = %wire.id, error = %e, "wire left unoriented");
            }
        }
        wire.events.clear();
        wire
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Curves in chain order.
    pub fn curves(&self) -> impl Iterator<Item = &Curve2d> + '_ {
        self.order.iter().map(move |k| &self.slots[*k].curve)
    }

    pub fn curve_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(move |k| self.slots[*k].id.as_str())
    }

    /// Curves in chain order with their reverse flag.
    pub fn oriented_curves(&self) -> impl Iterator<Item = (&Curve2d, bool)> + '_ {
        self.order.iter().map(move |k| {
            let slot = &self.slots[*k];
            (&slot.curve, slot.reversed)
        })
    }

    pub fn curve(&self, index: usize) -> Option<&Curve2d> {
        self.order.get(index).map(|k| &self.slots[*k].curve)
    }

    pub fn curve_by_id(&self, id: &str) -> Option<&Curve2d> {
        self.index.get(id).map(|k| &self.slots[*k].curve)
    }

    pub fn key_of(&self, id: &str) -> Option<CurveKey> {
        self.index.get(id).copied()
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        let key = self.key_of(id)?;
        self.order.iter().position(|k| *k == key)
    }

    /// Replaces the chain. Curves whose id survives keep their slot and
    /// reverse flag; new ids start unreversed. Duplicate ids are dropped.
    pub fn set_curves(&mut self, curves: Vec<WireCurve>, update_children: bool) {
        let mut next_order = Vec::with_capacity(curves.len());
        let mut seen: FxHashMap<String, CurveKey> = FxHashMap::default();

        for WireCurve { id, curve } in curves {
            if seen.contains_key(&id) {
                tracing::warn!(wire = %self.id, curve = %id, "duplicate curve id ignored");
                continue;
            }
            let key = match self.index.get(&id) {
                Some(&key) => {
                    self.slots[key].curve = curve;
                    key
                }
                None => {
                    if update_children {
                        self.events.push(WireEvent::ChildAdded(id.clone()));
                    }
                    self.slots.insert(CurveSlot {
                        id: id.clone(),
                        curve,
                        reversed: false,
                    })
                }
            };
            seen.insert(id, key);
            next_order.push(key);
        }

        let removed: Vec<CurveKey> = self
            .order
            .iter()
            .copied()
            .filter(|k| !next_order.contains(k))
            .collect();
        for key in removed {
            if let Some(slot) = self.slots.remove(key) {
                if update_children {
                    self.events.push(WireEvent::ChildRemoved(slot.id));
                }
            }
        }

        self.order = next_order;
        self.index = seen;
        self.events.push(WireEvent::FieldChanged(WireField::Curves));
    }

    /// Sets the traversal direction of one curve. Returns false when the id
    /// is not part of this wire.
    pub fn set_reverse(&mut self, id: &str, reversed: bool) -> bool {
        let Some(&key) = self.index.get(id) else {
            return false;
        };
        let slot = &mut self.slots[key];
        if slot.reversed != reversed {
            slot.reversed = reversed;
            self.events.push(WireEvent::FieldChanged(WireField::ReverseFlags));
        }
        true
    }

    pub fn is_reversed_curve(&self, id: &str) -> bool {
        self.index
            .get(id)
            .map(|k| self.slots[*k].reversed)
            .unwrap_or(false)
    }

    pub fn is_reversed(&self, index: usize) -> bool {
        self.order
            .get(index)
            .map(|k| self.slots[*k].reversed)
            .unwrap_or(false)
    }

    /// Recomputes every reverse flag so consecutive curves meet end to start.
    ///
    /// The first curve is flipped only if its start, and not its end, touches
    /// the second curve. Each following curve takes whichever orientation
    /// starts at the running tail. A curve that fits neither way stops the
    /// walk with [`Error::DisconnectedWire`]; flags before it are already fixed.
    pub fn fix_reverse(&mut self) -> Result<()> {
        if self.order.is_empty() {
            return Err(Error::EmptyWire);
        }

        let mut changed = false;
        let mut flags: Vec<bool> = self.order.iter().map(|k| self.slots[*k].reversed).collect();

        if self.order.len() > 1 {
            let first = &self.slots[self.order[0]].curve;
            let second = &self.slots[self.order[1]].curve;
            let end_touches = second.touches(&first.end());
            let start_touches = second.touches(&first.start());
            if start_touches && !end_touches {
                flags[0] = true;
            } else if end_touches && !start_touches {
                flags[0] = false;
            } else if !start_touches && !end_touches {
                return Err(Error::DisconnectedWire(0, 1));
            }
        } else {
            flags[0] = false;
        }

        let mut tail = self.slots[self.order[0]].curve.oriented_end(flags[0]);
        let mut failure = None;
        for i in 1..self.order.len() {
            let curve = &self.slots[self.order[i]].curve;
            let forward = (curve.start() - tail).norm() <= Tolerance::LENGTH;
            let backward = (curve.end() - tail).norm() <= Tolerance::LENGTH;
            match (forward, backward) {
                (true, false) => flags[i] = false,
                (false, true) => flags[i] = true,
                // Degenerate or closed curve: both fit, keep the stored flag
                (true, true) => {}
                (false, false) => {
                    failure = Some(Error::DisconnectedWire(i - 1, i));
                    break;
                }
            }
            tail = curve.oriented_end(flags[i]);
        }

        for (key, reversed) in self.order.iter().zip(flags) {
            let slot = &mut self.slots[*key];
            if slot.reversed != reversed {
                slot.reversed = reversed;
                changed = true;
            }
        }
        if changed {
            self.events.push(WireEvent::FieldChanged(WireField::ReverseFlags));
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Splices `new_curves` in place of the curve `old_id`.
    ///
    /// When the replaced curve was reversed the new curves are inserted in
    /// reverse order and flagged reversed, so a split of the old curve in
    /// its own direction keeps the chain connected. Returns false, leaving
    /// the wire untouched, if `old_id` is not in the wire or a new id repeats
    /// another new id or a surviving curve.
    pub fn replace_curve_by_curves(
        &mut self,
        old_id: &str,
        new_curves: Vec<WireCurve>,
        update_children: bool,
    ) -> bool {
        let Some(position) = self.position_of(old_id) else {
            return false;
        };
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for curve in &new_curves {
            let clashes = curve.id != old_id && self.index.contains_key(&curve.id);
            if clashes || !seen.insert(curve.id.as_str()) {
                tracing::debug!(wire = %self.id, curve = %curve.id, "replacement curve id already in use");
                return false;
            }
        }
        let was_reversed = self.is_reversed(position);

        let mut incoming = new_curves;
        if was_reversed {
            incoming.reverse();
        }
        let incoming_ids: Vec<String> = incoming.iter().map(|c| c.id.clone()).collect();

        let mut next: Vec<WireCurve> = Vec::with_capacity(self.order.len() + incoming.len());
        let mut incoming = Some(incoming);
        for (i, key) in self.order.iter().enumerate() {
            if i == position {
                if let Some(batch) = incoming.take() {
                    next.extend(batch);
                }
            } else {
                let slot = &self.slots[*key];
                next.push(WireCurve {
                    id: slot.id.clone(),
                    curve: slot.curve,
                });
            }
        }

        self.set_curves(next, update_children);
        for id in &incoming_ids {
            if let Some(&key) = self.index.get(id) {
                self.slots[key].reversed = was_reversed;
            }
        }
        if was_reversed {
            self.events.push(WireEvent::FieldChanged(WireField::ReverseFlags));
        }
        true
    }

    /// Key vertices: the oriented start of every curve, plus the final end
    /// point when the chain is open.
    pub fn points(&self) -> Vec<Point2<f64>> {
        let mut out: Vec<Point2<f64>> = self
            .oriented_curves()
            .map(|(c, rev)| c.oriented_start(rev))
            .collect();
        if let Some(last) = self.open_end() {
            out.push(last);
        }
        out
    }

    /// Vertices plus interior samples of curved segments, in chain order.
    /// Shared endpoints appear once; a closed chain does not repeat its start.
    pub fn discrete_points(&self, tessellation: &Tessellation) -> Vec<Point2<f64>> {
        let mut out = Vec::new();
        for (curve, reversed) in self.oriented_curves() {
            let samples = curve.sample(tessellation, reversed);
            // Drop the oriented end; the next curve starts there.
            let keep = samples.len().saturating_sub(1);
            out.extend(samples.into_iter().take(keep));
        }
        if let Some(last) = self.open_end() {
            out.push(last);
        }
        out
    }

    fn open_end(&self) -> Option<Point2<f64>> {
        let (first, first_rev) = self.oriented_curves().next()?;
        let (last, last_rev) = self.oriented_curves().last()?;
        let end = last.oriented_end(last_rev);
        if (end - first.oriented_start(first_rev)).norm() <= Tolerance::LENGTH {
            None
        } else {
            Some(end)
        }
    }

    pub fn is_include_non_linear_curve(&self) -> bool {
        self.curves().any(|c| !c.is_linear())
    }

    /// Non-empty and connected end to start under the current flags.
    pub fn verify(&self) -> bool {
        if self.order.is_empty() {
            return false;
        }
        let mut iter = self.oriented_curves();
        let Some((first, rev)) = iter.next() else {
            return false;
        };
        let mut tail = first.oriented_end(rev);
        for (curve, rev) in iter {
            if (curve.oriented_start(rev) - tail).norm() > Tolerance::LENGTH {
                return false;
            }
            tail = curve.oriented_end(rev);
        }
        true
    }

    pub fn is_closed(&self) -> bool {
        self.verify() && self.open_end().is_none()
    }

    pub fn set_loop_role(&mut self, role: Option<LoopRole>) {
        self.role = role;
    }

    pub fn loop_role(&self) -> Option<LoopRole> {
        self.role
    }

    /// True when the owning loop registered this wire as its outer boundary.
    pub fn is_outer(&self) -> bool {
        self.role == Some(LoopRole::Outer)
    }

    pub fn bbx(&self) -> Bounds2 {
        self.curves()
            .fold(Bounds2::empty(), |acc, c| acc.union(&c.bounds()))
    }

    pub fn transform(&mut self, m: &Matrix3<f64>) {
        for key in &self.order {
            let slot = &mut self.slots[*key];
            slot.curve = slot.curve.transformed(m);
        }
        self.events.push(WireEvent::FieldChanged(WireField::Curves));
    }

    pub fn pending_events(&self) -> &[WireEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<WireEvent> {
        std::mem::take(&mut self.events)
    }
}
