//! # Sprite affine matrices
//!
//! OAM has room for 32 affine matrices shared by up to 128 sprites. The
//! manager hands them out, keeps a usage count per matrix and remembers
//! which sprites use each one.
//!
//! ```ignore
//! let mut mats = AffineMatsManager::new(sprites);
//! let id = mats.create();
//! mats.attach_sprite(id, sprite);
//!
//! mats.set_rotation_angle(id, Fixed::from_int(45));
//!
//! // once per frame
//! mats.update();
//! wait_for_vblank();
//! if let Some(range) = mats.retrieve_commit_data() {
//!     oam.commit_affine_mats(range, mats.registers());
//! }
//! ```
//!
//! ## Register equality
//!
//! Mutators compare the register image before and after the change, not the
//! attributes. Close angles quantize to the same sine table entry, and a
//! change that doesn't reach the registers neither dirties the matrix nor
//! notifies its sprites.
//!
//! ## Flipped identity
//!
//! A matrix that is the identity up to flips doesn't need the affine renderer:
//! a regular sprite with its flip bits set looks the same. When a matrix
//! becomes a flipped identity its sprites are asked, during the next
//! [`update`](AffineMatsManager::update), whether they still want it.

mod attach;
mod attributes;

use heapless::Vec;
use log::{debug, trace};

use crate::config::AFFINE_MATS_COUNT;
use crate::math::Fixed;

pub use attach::AttachedSprites;
pub use attributes::{AffineMatAttributes, AffineMatRegisters};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AffineMatId(u8);

impl AffineMatId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SpriteId(u8);

impl SpriteId {
    pub fn new(index: usize) -> Self {
        assert!(index < crate::config::SPRITES_COUNT, "Invalid sprite index: {}", index);

        Self(index as u8)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpriteShape {
    Square,
    Wide,
    Tall,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpriteSize {
    Small,
    Normal,
    Big,
    Huge,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SpriteShapeSize {
    pub shape: SpriteShape,
    pub size: SpriteSize,
}

/// Matrices to upload: `[offset, offset + count)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AffineCommitRange {
    pub offset: usize,
    pub count: usize,
}

/// The sprite side of the attachment lists.
pub trait AffineMatSprites {
    /// Registers of `mat` changed, so the double size state of `sprite` may
    /// have changed too.
    fn update_double_size(&mut self, sprite: SpriteId, mat: AffineMatId);

    /// `mat` became a flipped identity. Returns `true` when `sprite` switched
    /// to regular rendering and no longer needs it.
    fn remove_identity_mat_if_not_needed(&mut self, sprite: SpriteId, mat: AffineMatId) -> bool;
}

/// Inclusive index range, empty while `first > last`.
#[derive(Copy, Clone, Debug)]
struct IndexRange {
    first: usize,
    last: usize,
}

impl IndexRange {
    const EMPTY: IndexRange = IndexRange {
        first: AFFINE_MATS_COUNT,
        last: 0,
    };

    fn add(&mut self, index: usize) {
        self.first = self.first.min(index);
        self.last = self.last.max(index);
    }

    fn take(&mut self) -> Option<(usize, usize)> {
        let range = core::mem::replace(self, Self::EMPTY);

        if range.first < AFFINE_MATS_COUNT {
            Some((range.first, range.last))
        } else {
            None
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct Item {
    attributes: AffineMatAttributes,
    usages: u16,
    flipped_identity: bool,
    remove_if_not_needed: bool,
}

impl Item {
    const FREE: Item = Item {
        attributes: AffineMatAttributes::IDENTITY,
        usages: 0,
        flipped_identity: true,
        remove_if_not_needed: false,
    };
}

pub struct AffineMatsManager<S: AffineMatSprites> {
    items: [Item; AFFINE_MATS_COUNT],
    registers: [AffineMatRegisters; AFFINE_MATS_COUNT],
    attached: AttachedSprites,
    free_indexes: Vec<u8, AFFINE_MATS_COUNT>,
    to_commit: IndexRange,
    to_remove_if_not_needed: IndexRange,
    sprites: S,
}

impl<S: AffineMatSprites> AffineMatsManager<S> {
    pub fn new(sprites: S) -> Self {
        let mut free_indexes = Vec::new();
        for index in (0..AFFINE_MATS_COUNT as u8).rev() {
            let _ = free_indexes.push(index);
        }

        Self {
            items: [Item::FREE; AFFINE_MATS_COUNT],
            registers: [AffineMatRegisters::IDENTITY; AFFINE_MATS_COUNT],
            attached: AttachedSprites::new(),
            free_indexes,
            to_commit: IndexRange::EMPTY,
            to_remove_if_not_needed: IndexRange::EMPTY,
            sprites,
        }
    }

    pub fn sprites(&self) -> &S {
        &self.sprites
    }

    pub fn sprites_mut(&mut self) -> &mut S {
        &mut self.sprites
    }

    pub fn used_count(&self) -> usize {
        AFFINE_MATS_COUNT - self.free_indexes.len()
    }

    pub fn available_count(&self) -> usize {
        self.free_indexes.len()
    }

    /// Identity matrix with one usage. Panics when every matrix is taken.
    pub fn create(&mut self) -> AffineMatId {
        self.create_with(AffineMatAttributes::IDENTITY)
    }

    pub fn create_with(&mut self, attributes: AffineMatAttributes) -> AffineMatId {
        match self.create_optional_with(attributes) {
            Some(id) => id,
            None => panic!("No more sprite affine mats available"),
        }
    }

    pub fn create_optional(&mut self) -> Option<AffineMatId> {
        self.create_optional_with(AffineMatAttributes::IDENTITY)
    }

    pub fn create_optional_with(&mut self, attributes: AffineMatAttributes) -> Option<AffineMatId> {
        let index = self.free_indexes.pop()? as usize;

        self.items[index] = Item {
            attributes,
            usages: 1,
            flipped_identity: attributes.flipped_identity(),
            remove_if_not_needed: false,
        };
        self.registers[index] = attributes.registers();
        self.to_commit.add(index);
        debug!(target: "affine", "created affine mat {}", index);
        Some(AffineMatId(index as u8))
    }

    pub fn usages(&self, id: AffineMatId) -> u16 {
        self.items[id.index()].usages
    }

    pub fn increase_usages(&mut self, id: AffineMatId) {
        self.items[id.index()].usages += 1;
    }

    /// Releases one usage. The last one returns the matrix to the pool, and
    /// no sprite may be attached to it by then.
    pub fn decrease_usages(&mut self, id: AffineMatId) {
        let item = &mut self.items[id.index()];
        assert!(item.usages > 0, "Affine mat {} is not in use", id.0);
        item.usages -= 1;

        if item.usages == 0 {
            assert!(
                self.attached.is_empty(id),
                "Affine mat {} released with {} attached sprites",
                id.0,
                self.attached.len(id)
            );

            item.remove_if_not_needed = false;
            let _ = self.free_indexes.push(id.0);
            debug!(target: "affine", "released affine mat {}", id.0);
        }
    }

    pub fn attach_sprite(&mut self, id: AffineMatId, sprite: SpriteId) {
        self.attached.push_back(id, sprite);
    }

    pub fn dettach_sprite(&mut self, id: AffineMatId, sprite: SpriteId) {
        self.attached.erase(id, sprite);
    }

    pub fn attached_sprites(&self) -> &AttachedSprites {
        &self.attached
    }

    pub fn attributes(&self, id: AffineMatId) -> &AffineMatAttributes {
        &self.items[id.index()].attributes
    }

    pub fn rotation_angle(&self, id: AffineMatId) -> Fixed {
        self.attributes(id).rotation_angle()
    }

    pub fn horizontal_scale(&self, id: AffineMatId) -> Fixed {
        self.attributes(id).horizontal_scale()
    }

    pub fn vertical_scale(&self, id: AffineMatId) -> Fixed {
        self.attributes(id).vertical_scale()
    }

    pub fn horizontal_shear(&self, id: AffineMatId) -> Fixed {
        self.attributes(id).horizontal_shear()
    }

    pub fn vertical_shear(&self, id: AffineMatId) -> Fixed {
        self.attributes(id).vertical_shear()
    }

    pub fn horizontal_flip(&self, id: AffineMatId) -> bool {
        self.attributes(id).horizontal_flip()
    }

    pub fn vertical_flip(&self, id: AffineMatId) -> bool {
        self.attributes(id).vertical_flip()
    }

    pub fn identity(&self, id: AffineMatId) -> bool {
        self.attributes(id).identity()
    }

    pub fn flipped_identity(&self, id: AffineMatId) -> bool {
        self.items[id.index()].flipped_identity
    }

    /// Applies `change` to the attributes of `id`, then recommits and
    /// notifies the attached sprites if the registers changed.
    fn mutate(&mut self, id: AffineMatId, change: impl FnOnce(&mut AffineMatAttributes)) {
        let index = id.index();
        let old_registers = self.items[index].attributes.registers();
        change(&mut self.items[index].attributes);
        self.update_flipped_identity(id);

        if self.items[index].attributes.registers() != old_registers {
            self.registers_changed(id);
        }
    }

    pub fn set_rotation_angle(&mut self, id: AffineMatId, rotation_angle: Fixed) {
        if rotation_angle != self.rotation_angle(id) {
            self.mutate(id, |attributes| attributes.set_rotation_angle(rotation_angle));
        }
    }

    pub fn set_horizontal_scale(&mut self, id: AffineMatId, horizontal_scale: Fixed) {
        if horizontal_scale != self.horizontal_scale(id) {
            self.mutate(id, |attributes| attributes.set_horizontal_scale(horizontal_scale));
        }
    }

    pub fn set_vertical_scale(&mut self, id: AffineMatId, vertical_scale: Fixed) {
        if vertical_scale != self.vertical_scale(id) {
            self.mutate(id, |attributes| attributes.set_vertical_scale(vertical_scale));
        }
    }

    pub fn set_scale(&mut self, id: AffineMatId, scale: Fixed) {
        self.set_scale_xy(id, scale, scale);
    }

    pub fn set_scale_xy(&mut self, id: AffineMatId, horizontal_scale: Fixed, vertical_scale: Fixed) {
        if horizontal_scale != self.horizontal_scale(id) || vertical_scale != self.vertical_scale(id) {
            self.mutate(id, |attributes| attributes.set_scale_xy(horizontal_scale, vertical_scale));
        }
    }

    pub fn set_horizontal_shear(&mut self, id: AffineMatId, horizontal_shear: Fixed) {
        if horizontal_shear != self.horizontal_shear(id) {
            self.mutate(id, |attributes| attributes.set_horizontal_shear(horizontal_shear));
        }
    }

    pub fn set_vertical_shear(&mut self, id: AffineMatId, vertical_shear: Fixed) {
        if vertical_shear != self.vertical_shear(id) {
            self.mutate(id, |attributes| attributes.set_vertical_shear(vertical_shear));
        }
    }

    pub fn set_shear(&mut self, id: AffineMatId, shear: Fixed) {
        self.set_shear_xy(id, shear, shear);
    }

    pub fn set_shear_xy(&mut self, id: AffineMatId, horizontal_shear: Fixed, vertical_shear: Fixed) {
        if horizontal_shear != self.horizontal_shear(id) || vertical_shear != self.vertical_shear(id) {
            self.mutate(id, |attributes| attributes.set_shear_xy(horizontal_shear, vertical_shear));
        }
    }

    /// Flips don't change the double size state, so sprites aren't notified.
    pub fn set_horizontal_flip(&mut self, id: AffineMatId, horizontal_flip: bool) {
        if horizontal_flip != self.horizontal_flip(id) {
            let index = id.index();
            self.items[index].attributes.set_horizontal_flip(horizontal_flip);
            self.registers[index] = self.items[index].attributes.registers();
            self.to_commit.add(index);
        }
    }

    pub fn set_vertical_flip(&mut self, id: AffineMatId, vertical_flip: bool) {
        if vertical_flip != self.vertical_flip(id) {
            let index = id.index();
            self.items[index].attributes.set_vertical_flip(vertical_flip);
            self.registers[index] = self.items[index].attributes.registers();
            self.to_commit.add(index);
        }
    }

    pub fn set_attributes(&mut self, id: AffineMatId, attributes: AffineMatAttributes) {
        self.mutate(id, |current| *current = attributes);
    }

    /// Forces `id` into the next commit.
    pub fn reload(&mut self, id: AffineMatId) {
        self.to_commit.add(id.index());
    }

    fn update_flipped_identity(&mut self, id: AffineMatId) {
        let index = id.index();
        let item = &mut self.items[index];

        if item.attributes.flipped_identity() {
            if !item.flipped_identity {
                item.flipped_identity = true;

                if !self.attached.is_empty(id) {
                    item.remove_if_not_needed = true;
                    self.to_remove_if_not_needed.add(index);
                }
            }
        } else {
            item.flipped_identity = false;
            item.remove_if_not_needed = false;
        }
    }

    fn registers_changed(&mut self, id: AffineMatId) {
        let index = id.index();
        self.registers[index] = self.items[index].attributes.registers();
        self.to_commit.add(index);
        trace!(target: "affine", "affine mat {} changed: {:?}", index, self.registers[index]);

        for sprite in self.attached.iter(id) {
            self.sprites.update_double_size(sprite, id);
        }
    }

    /// Lets sprites attached to matrices that became flipped identities drop
    /// them. Must run once per frame, before the commit.
    pub fn update(&mut self) {
        let Some((first, last)) = self.to_remove_if_not_needed.take() else {
            return;
        };

        for index in first..=last {
            if !self.items[index].remove_if_not_needed {
                continue;
            }

            let id = AffineMatId(index as u8);
            self.items[index].remove_if_not_needed = false;

            // keeps the matrix alive while its sprites release it
            self.increase_usages(id);

            let mut cursor = self.attached.first(id);

            while let Some(sprite) = cursor {
                cursor = self.attached.next(sprite);

                if self.sprites.remove_identity_mat_if_not_needed(sprite, id) {
                    self.dettach_sprite(id, sprite);
                    self.decrease_usages(id);
                }
            }

            self.decrease_usages(id);
        }
    }

    /// Dirty range since the last call, if any.
    pub fn retrieve_commit_data(&mut self) -> Option<AffineCommitRange> {
        self.to_commit.take().map(|(first, last)| AffineCommitRange {
            offset: first,
            count: last - first + 1,
        })
    }

    /// Register images indexed by matrix id.
    pub fn registers(&self) -> &[AffineMatRegisters; AFFINE_MATS_COUNT] {
        &self.registers
    }

    /// Whether a sprite of `shape_size` using `id` needs double size mode
    /// to avoid being clipped.
    pub fn sprite_double_size(&self, id: AffineMatId, shape_size: SpriteShapeSize) -> bool {
        if self.items[id.index()].flipped_identity {
            return false;
        }

        let registers = self.registers[id.index()];

        match (shape_size.shape, shape_size.size) {
            (SpriteShape::Square, _) => exceeds_bounds::<32, 32>(registers),
            (SpriteShape::Wide, SpriteSize::Normal) => exceeds_bounds::<32, 8>(registers),
            (SpriteShape::Wide, _) => exceeds_bounds::<32, 16>(registers),
            (SpriteShape::Tall, SpriteSize::Normal) => exceeds_bounds::<8, 32>(registers),
            (SpriteShape::Tall, _) => exceeds_bounds::<16, 32>(registers),
        }
    }
}

/// Whether the transformed corners of a `2 * HALF_WIDTH` by
/// `2 * HALF_HEIGHT` box leave it.
fn exceeds_bounds<const HALF_WIDTH: i32, const HALF_HEIGHT: i32>(registers: AffineMatRegisters) -> bool {
    let pa = registers.pa as i32;
    let pb = registers.pb as i32;
    let pc = registers.pc as i32;
    let pd = registers.pd as i32;
    let divisor = pa * pd - pb * pc;

    if divisor == 0 {
        return true;
    }

    let outside_x = |x: i32| x < -HALF_WIDTH || x >= HALF_WIDTH;
    let outside_y = |y: i32| y < -HALF_HEIGHT || y >= HALF_HEIGHT;

    if pb != 0 || pd != 0 {
        let ix1 = ((-256 * HALF_HEIGHT * pb) - (256 * HALF_WIDTH * pd) + (256 * pb)) / divisor;

        if outside_x(ix1) {
            return true;
        }

        let ix2 = ((-256 * HALF_HEIGHT * pb) + (256 * HALF_WIDTH * pd) + (256 * pb) - (256 * pd)) / divisor;

        if outside_x(ix2) {
            return true;
        }
    }

    let iy1 = (256 * ((HALF_HEIGHT * pa) + (HALF_WIDTH * pc) - pa)) / divisor;

    if outside_y(iy1) {
        return true;
    }

    let iy2 = (256 * ((HALF_HEIGHT * pa) - (HALF_WIDTH * pc) - pa + pc)) / divisor;
    outside_y(iy2)
}
