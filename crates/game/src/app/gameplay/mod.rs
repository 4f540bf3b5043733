mod combat;
mod hud;
mod scene;

pub(crate) use scene::PlatformerScene;

#[cfg(test)]
mod tests;
