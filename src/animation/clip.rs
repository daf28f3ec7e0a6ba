use rustc_hash::FxHashMap;

use crate::animation::channel::AnimationChannel;
use crate::assets::source::SourceAnimation;
use crate::errors::{LoadReport, SkinningError};
use crate::scene::graph::NodeGraph;
use crate::scene::skeleton::Skeleton;
use crate::scene::NodeId;

/// A named set of channels sharing one timeline.
///
/// Built once at load time and read-only afterwards.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    name: String,
    /// Latest key time over all channels, in ticks.
    duration: f32,
    /// Playback rate hint; 0 when the asset did not provide one.
    ticks_per_second: f32,
    channels: Vec<AnimationChannel>,
    /// Node -> index into `channels`.
    node_channels: FxHashMap<NodeId, usize>,
    /// Size of the graph the node ids above refer to.
    node_count: usize,
}

impl AnimationClip {
    /// Builds a clip from an imported animation.
    ///
    /// Channels whose target node does not exist are reported and skipped:
    /// they could not move anything anyway.
    pub fn build(
        source: &SourceAnimation,
        graph: &NodeGraph,
        skeleton: &Skeleton,
        report: &mut LoadReport,
    ) -> Self {
        let mut clip = Self {
            name: source.name.clone(),
            duration: 0.0,
            ticks_per_second: source.ticks_per_second,
            channels: Vec::with_capacity(source.channels.len()),
            node_channels: FxHashMap::default(),
            node_count: graph.len(),
        };

        for raw in &source.channels {
            let Some(node) = graph.node_by_name(&raw.node_name) else {
                report.warn(SkinningError::UnresolvedChannel {
                    node: raw.node_name.clone(),
                });
                continue;
            };

            let channel = AnimationChannel::load_from_source(raw, skeleton, report);
            clip.insert(node, channel);
        }

        log::info!(
            "Loaded animation clip '{}': {} channels, duration {} ticks at {} ticks/s",
            clip.name,
            clip.channels.len(),
            clip.duration,
            clip.ticks_per_second,
        );

        clip
    }

    /// Assembles a clip from channels bound to `graph` by name.
    ///
    /// Channels whose node is unknown are dropped with a warning.
    #[must_use]
    pub fn from_channels(
        name: impl Into<String>,
        ticks_per_second: f32,
        channels: Vec<AnimationChannel>,
        graph: &NodeGraph,
    ) -> Self {
        let mut clip = Self {
            name: name.into(),
            duration: 0.0,
            ticks_per_second,
            channels: Vec::with_capacity(channels.len()),
            node_channels: FxHashMap::default(),
            node_count: graph.len(),
        };

        for channel in channels {
            match graph.node_by_name(channel.target_node_name()) {
                Some(node) => clip.insert(node, channel),
                None => log::warn!(
                    "Animation channel targets unknown node '{}'",
                    channel.target_node_name()
                ),
            }
        }

        clip
    }

    fn insert(&mut self, node: NodeId, channel: AnimationChannel) {
        if self.node_channels.contains_key(&node) {
            log::warn!(
                "Clip '{}' animates node '{}' twice, keeping the first channel",
                self.name,
                channel.target_node_name()
            );
            return;
        }

        self.duration = self.duration.max(channel.max_time());
        self.node_channels.insert(node, self.channels.len());
        self.channels.push(channel);
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[inline]
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[inline]
    #[must_use]
    pub fn ticks_per_second(&self) -> f32 {
        self.ticks_per_second
    }

    #[inline]
    #[must_use]
    pub fn channels(&self) -> &[AnimationChannel] {
        &self.channels
    }

    /// Node count of the graph this clip was bound to.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// The channel animating `node`, if any.
    #[inline]
    #[must_use]
    pub fn channel_for_node(&self, node: NodeId) -> Option<&AnimationChannel> {
        self.node_channels.get(&node).map(|&index| &self.channels[index])
    }
}
