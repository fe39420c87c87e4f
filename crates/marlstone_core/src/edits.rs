use std::sync::mpsc;

use glam::{IVec3, Vec3};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EditKind {
    Add,
    Remove,
}

impl EditKind {
    pub fn from_adding(adding: bool) -> Self {
        if adding {
            EditKind::Add
        } else {
            EditKind::Remove
        }
    }

    pub fn is_adding(self) -> bool {
        matches!(self, EditKind::Add)
    }

    /// Sample value written by a single-point edit.
    pub fn target_value(self) -> f32 {
        match self {
            EditKind::Add => 1.0,
            EditKind::Remove => 0.0,
        }
    }

    /// Snaps a position onto the sample lattice: adds round up, removes round down.
    ///
    /// The asymmetry decides which lattice point gets sealed or opened next to
    /// the cursor. It is kept as-is; see DESIGN.md.
    pub fn snap(self, position: Vec3) -> IVec3 {
        match self {
            EditKind::Add => position.ceil().as_ivec3(),
            EditKind::Remove => position.floor().as_ivec3(),
        }
    }
}

/// Spherical edit with linear falloff towards the rim.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Brush {
    pub center: Vec3,
    pub radius: f32,
    /// 0..=1, where 1 writes the target value outright at the center.
    pub speed: f32,
    pub kind: EditKind,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum EditCommand {
    Point { position: Vec3, kind: EditKind },
    Brush(Brush),
}

pub struct EditSender {
    tx: mpsc::Sender<EditCommand>,
}

pub struct EditReceiver {
    rx: mpsc::Receiver<EditCommand>,
}

pub fn edit_queue() -> (EditSender, EditReceiver) {
    let (tx, rx) = mpsc::channel();
    (EditSender { tx }, EditReceiver { rx })
}

impl Clone for EditSender {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl EditSender {
    pub fn send(&self, command: EditCommand) -> Result<(), mpsc::SendError<EditCommand>> {
        self.tx.send(command)
    }

    pub fn point(
        &self,
        position: Vec3,
        adding: bool,
    ) -> Result<(), mpsc::SendError<EditCommand>> {
        self.send(EditCommand::Point {
            position,
            kind: EditKind::from_adding(adding),
        })
    }

    pub fn brush(&self, brush: Brush) -> Result<(), mpsc::SendError<EditCommand>> {
        self.send(EditCommand::Brush(brush))
    }
}

impl EditReceiver {
    pub fn try_recv(&self) -> Result<EditCommand, mpsc::TryRecvError> {
        self.rx.try_recv()
    }

    /// Everything queued so far, in send order. Does not block.
    pub fn pending(&self) -> mpsc::TryIter<'_, EditCommand> {
        self.rx.try_iter()
    }
}
