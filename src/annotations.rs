use bitflags::bitflags;

bitflags! {
    /// Flags that can be set on every sample of a trajectory
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct PathFlags: u32 {
        const NONE = 0b0000_0000;

        /// Sample of a pen stroke, the pen touches the surface.
        const PEN_DOWN =       0b0000_0001;

        /// Sample of a lift move: the pen rises, travels over the surface and comes down
        /// at the start of the next stroke.
        const LIFT =           0b0000_0010;

        /// Sample where two concatenated moves meet. It is the last sample of the earlier
        /// move, the coincident first sample of the later move has been dropped.
        const SEAM =           0b0000_0100;
    }
}
