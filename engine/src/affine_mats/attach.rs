//! Per matrix lists of attached sprites.
//!
//! Every sprite has one node in a fixed arena, linked into the list of the
//! matrix it uses. Attaching and detaching are O(1) and nothing points back
//! into sprite storage.

use crate::config::{AFFINE_MATS_COUNT, SPRITES_COUNT};

use super::{AffineMatId, SpriteId};

#[derive(Copy, Clone, Debug, Default)]
struct Node {
    mat: Option<u8>,
    prev: Option<u8>,
    next: Option<u8>,
}

#[derive(Copy, Clone, Debug, Default)]
struct List {
    head: Option<u8>,
    tail: Option<u8>,
    len: u8,
}

pub struct AttachedSprites {
    nodes: [Node; SPRITES_COUNT],
    lists: [List; AFFINE_MATS_COUNT],
}

impl AttachedSprites {
    pub const fn new() -> Self {
        Self {
            nodes: [Node { mat: None, prev: None, next: None }; SPRITES_COUNT],
            lists: [List { head: None, tail: None, len: 0 }; AFFINE_MATS_COUNT],
        }
    }

    pub fn len(&self, mat: AffineMatId) -> usize {
        self.lists[mat.index()].len as usize
    }

    pub fn is_empty(&self, mat: AffineMatId) -> bool {
        self.lists[mat.index()].len == 0
    }

    /// Matrix `sprite` is attached to.
    pub fn mat(&self, sprite: SpriteId) -> Option<AffineMatId> {
        self.nodes[sprite.index()].mat.map(AffineMatId)
    }

    pub fn first(&self, mat: AffineMatId) -> Option<SpriteId> {
        self.lists[mat.index()].head.map(SpriteId)
    }

    pub fn next(&self, sprite: SpriteId) -> Option<SpriteId> {
        self.nodes[sprite.index()].next.map(SpriteId)
    }

    pub fn iter(&self, mat: AffineMatId) -> impl Iterator<Item = SpriteId> + '_ {
        core::iter::successors(self.first(mat), |sprite| self.next(*sprite))
    }

    /// Appends `sprite` to the back of the list of `mat`.
    pub fn push_back(&mut self, mat: AffineMatId, sprite: SpriteId) {
        let node = &mut self.nodes[sprite.index()];
        assert!(node.mat.is_none(), "Sprite {} is already attached", sprite.0);

        let list = &mut self.lists[mat.index()];
        *node = Node {
            mat: Some(mat.0),
            prev: list.tail,
            next: None,
        };

        match list.tail {
            Some(tail) => self.nodes[tail as usize].next = Some(sprite.0),
            None => list.head = Some(sprite.0),
        }

        list.tail = Some(sprite.0);
        list.len += 1;
    }

    pub fn erase(&mut self, mat: AffineMatId, sprite: SpriteId) {
        let node = self.nodes[sprite.index()];
        assert!(node.mat == Some(mat.0), "Sprite {} is not attached to {}", sprite.0, mat.0);

        let list = &mut self.lists[mat.index()];

        match node.prev {
            Some(prev) => self.nodes[prev as usize].next = node.next,
            None => list.head = node.next,
        }

        match node.next {
            Some(next) => self.nodes[next as usize].prev = node.prev,
            None => list.tail = node.prev,
        }

        list.len -= 1;
        self.nodes[sprite.index()] = Node::default();
    }
}

impl Default for AttachedSprites {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(list: &AttachedSprites, mat: AffineMatId) -> std::vec::Vec<u8> {
        list.iter(mat).map(|sprite| sprite.0).collect()
    }

    #[test]
    fn erase_from_any_position() {
        let mat = AffineMatId(3);
        let mut list = AttachedSprites::new();

        for sprite in [5, 9, 2, 7] {
            list.push_back(mat, SpriteId(sprite));
        }

        list.erase(mat, SpriteId(9));
        assert_eq!(collect(&list, mat), [5, 2, 7]);

        list.erase(mat, SpriteId(5));
        list.erase(mat, SpriteId(7));
        assert_eq!(collect(&list, mat), [2]);
        assert_eq!(list.len(mat), 1);

        list.erase(mat, SpriteId(2));
        assert!(list.is_empty(mat));
        assert_eq!(list.mat(SpriteId(2)), None);
    }

    #[test]
    fn lists_are_independent() {
        let mut list = AttachedSprites::new();
        list.push_back(AffineMatId(0), SpriteId(1));
        list.push_back(AffineMatId(1), SpriteId(2));

        assert_eq!(collect(&list, AffineMatId(0)), [1]);
        assert_eq!(list.mat(SpriteId(2)), Some(AffineMatId(1)));
    }

    #[test]
    #[should_panic]
    fn sprite_can_only_be_attached_once() {
        let mut list = AttachedSprites::new();
        list.push_back(AffineMatId(0), SpriteId(1));
        list.push_back(AffineMatId(1), SpriteId(1));
    }
}
