//! Generic `PositionSink` trait for whatever carries the player on screen.
//!
//! Implementations wrap the rendering/physics collaborator.  The posture
//! controller only ever calls this trait, once per tick while a transition is
//! running.

/// Vertical-axis access to the player's body.
///
/// Writes are fire-and-forget: the physics side is expected to accept any
/// finite coordinate.
pub trait PositionSink: Send {
    /// Most recently known vertical coordinate (world units).
    fn vertical(&self) -> f32;

    /// Move the body to vertical coordinate `y`, keeping its other axes.
    fn set_vertical(&mut self, y: f32);
}

impl<P: PositionSink + ?Sized> PositionSink for Box<P> {
    fn vertical(&self) -> f32 {
        (**self).vertical()
    }

    fn set_vertical(&mut self, y: f32) {
        (**self).set_vertical(y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal in-process body used only for tests.
    struct MockBody {
        y: f32,
    }

    impl PositionSink for MockBody {
        fn vertical(&self) -> f32 {
            self.y
        }

        fn set_vertical(&mut self, y: f32) {
            self.y = y;
        }
    }

    #[test]
    fn mock_body_set_and_get_vertical() {
        let mut body = MockBody { y: 0.0 };
        body.set_vertical(-3.0);
        assert!((body.vertical() - (-3.0)).abs() < f32::EPSILON);
    }

    #[test]
    fn boxed_sink_forwards_calls() {
        let mut body: Box<dyn PositionSink> = Box::new(MockBody { y: 1.0 });
        body.set_vertical(2.5);
        assert!((body.vertical() - 2.5).abs() < f32::EPSILON);
    }
}
