use crate::protocol::MemberId;

/// MemberSelector decides the order in which a connection tries cluster
/// members. A hinted leader is always yielded first; the remaining members
/// follow in configuration order. The sequence is consumed by `next()` until
/// exhaustion and replayed from the start by `reset()`.
pub struct MemberSelector {
    leader: Option<MemberId>,
    members: Vec<MemberId>,
    sequence: Vec<MemberId>,
    position: usize,
}

impl MemberSelector {
    pub fn new(leader: Option<MemberId>, members: Vec<MemberId>) -> Self {
        let sequence = Self::build_sequence(&leader, &members);
        MemberSelector {
            leader,
            members,
            sequence,
            position: 0,
        }
    }

    pub fn leader(&self) -> Option<&MemberId> {
        self.leader.as_ref()
    }

    pub fn servers(&self) -> &[MemberId] {
        &self.members
    }

    pub fn has_next(&self) -> bool {
        self.position < self.sequence.len()
    }

    pub fn next(&mut self) -> Option<MemberId> {
        let member = self.sequence.get(self.position).cloned();
        if member.is_some() {
            self.position += 1;
        }
        member
    }

    /// `reset()` restarts iteration from the front of the current sequence.
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// `reset_view()` atomically adopts a new membership view and leader
    /// hint. Any ongoing iteration starts over on the next `next()`.
    pub fn reset_view(&mut self, leader: Option<MemberId>, members: Vec<MemberId>) {
        self.sequence = Self::build_sequence(&leader, &members);
        self.leader = leader;
        self.members = members;
        self.position = 0;
    }

    fn build_sequence(leader: &Option<MemberId>, members: &[MemberId]) -> Vec<MemberId> {
        let mut sequence = Vec::with_capacity(members.len() + 1);
        if let Some(leader) = leader {
            sequence.push(leader.clone());
        }
        for member in members {
            if Some(member) != leader.as_ref() {
                sequence.push(member.clone());
            }
        }
        sequence
    }
}
