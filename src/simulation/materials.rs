//! Material definitions and registry

use serde::{Deserialize, Serialize};

use super::color::{self, Color};
use super::temperature::ThermalRule;
use crate::world::{Cell, WorldRng};

/// Closed set of materials a cell can hold
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Material {
    #[default]
    Empty = 0,
    Border = 1,
    Sand = 2,
    Water = 3,
    Wood = 4,
    Stone = 5,
    Lava = 6,
    Fire = 7,
    Smoke = 8,
}

impl Material {
    pub const ALL: [Material; 9] = [
        Material::Empty,
        Material::Border,
        Material::Sand,
        Material::Water,
        Material::Wood,
        Material::Stone,
        Material::Lava,
        Material::Fire,
        Material::Smoke,
    ];

    /// Look up a material by raw id. Unknown ids map to `Empty`.
    pub fn from_id(id: u8) -> Self {
        Self::ALL.get(id as usize).copied().unwrap_or(Material::Empty)
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Look up a material by its registry name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            Material::Empty => "empty",
            Material::Border => "border",
            Material::Sand => "sand",
            Material::Water => "water",
            Material::Wood => "wood",
            Material::Stone => "stone",
            Material::Lava => "lava",
            Material::Fire => "fire",
            Material::Smoke => "smoke",
        }
    }

    /// Empty and border cells are never dispatched to a movement rule
    pub fn is_inert(self) -> bool {
        matches!(self, Material::Empty | Material::Border)
    }
}

/// How a material behaves physically
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialType {
    /// Falls and slides (sand, stone, wood)
    Solid,
    /// Flows sideways (water, lava)
    Liquid,
    /// Rises and disperses (fire, smoke)
    Gas,
}

/// Definition of a material's properties
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaterialDef {
    pub material: Material,
    pub material_type: MaterialType,

    /// Base color (RGBA)
    pub color: [u8; 4],
    /// Apply HSL jitter to the base color on creation
    pub jitter_color: bool,

    /// Creation temperature band (min, max)
    pub temperature: (f32, f32),
    /// Creation life band (min, max)
    pub life: (f32, f32),

    /// Chance a neighbor resists being knocked loose (solids)
    pub inertial_resistance: f32,

    /// Per-tick thermal step
    pub thermal: ThermalRule,
}

impl Default for MaterialDef {
    fn default() -> Self {
        Self {
            material: Material::Empty,
            material_type: MaterialType::Solid,
            color: [0, 0, 0, 255],
            jitter_color: false,
            temperature: (20.0, 20.0),
            life: (0.0, 0.0),
            inertial_resistance: 0.1,
            thermal: ThermalRule::Inert,
        }
    }
}

impl MaterialDef {
    pub fn base_color(&self) -> Color {
        let [r, g, b, a] = self.color;
        Color::new(r as f32, g as f32, b as f32, a as f32)
    }
}

/// Registry of all materials
///
/// Immutable after construction; the world owns one and hands out fresh cells
/// through [`Materials::create`].
pub struct Materials {
    materials: Vec<MaterialDef>,
}

impl Materials {
    pub fn new() -> Self {
        let mut materials = Self {
            materials: Vec::with_capacity(Material::ALL.len()),
        };
        materials.register_defaults();
        materials
    }

    fn register(&mut self, def: MaterialDef) {
        let id = def.material.id() as usize;
        if id >= self.materials.len() {
            self.materials.resize_with(id + 1, MaterialDef::default);
        }
        self.materials[id] = def;
    }

    fn register_defaults(&mut self) {
        self.register(MaterialDef {
            material: Material::Empty,
            ..Default::default()
        });

        self.register(MaterialDef {
            material: Material::Border,
            temperature: (0.0, 0.0),
            ..Default::default()
        });

        self.register(MaterialDef {
            material: Material::Sand,
            thermal: ThermalRule::Diffuse,
            color: [194, 177, 95, 255],
            jitter_color: true,
            temperature: (30.0, 36.0),
            life: (2.0, 5.0),
            inertial_resistance: 0.1,
            ..Default::default()
        });

        self.register(MaterialDef {
            material: Material::Water,
            thermal: ThermalRule::Diffuse,
            material_type: MaterialType::Liquid,
            color: [48, 135, 255, 255],
            jitter_color: true,
            temperature: (10.0, 25.0),
            life: (10.0, 25.0),
            ..Default::default()
        });

        self.register(MaterialDef {
            material: Material::Wood,
            thermal: ThermalRule::Combustible,
            color: [71, 41, 14, 255],
            jitter_color: true,
            temperature: (20.0, 22.0),
            life: (20.0, 30.0),
            inertial_resistance: 0.6,
            ..Default::default()
        });

        self.register(MaterialDef {
            material: Material::Stone,
            thermal: ThermalRule::Diffuse,
            color: [130, 125, 120, 255],
            jitter_color: true,
            temperature: (30.0, 36.0),
            life: (35.0, 50.0),
            inertial_resistance: 0.4,
            ..Default::default()
        });

        self.register(MaterialDef {
            material: Material::Lava,
            thermal: ThermalRule::HeatSource,
            material_type: MaterialType::Liquid,
            color: [212, 80, 19, 255],
            jitter_color: true,
            temperature: (1000.0, 1200.0),
            life: (15.0, 30.0),
            ..Default::default()
        });

        self.register(MaterialDef {
            material: Material::Fire,
            thermal: ThermalRule::Flame,
            material_type: MaterialType::Gas,
            color: [212, 120, 70, 255],
            jitter_color: true,
            temperature: (900.0, 1000.0),
            life: (15.0, 30.0),
            ..Default::default()
        });

        self.register(MaterialDef {
            material: Material::Smoke,
            thermal: ThermalRule::Smoke,
            material_type: MaterialType::Gas,
            color: [44, 44, 44, 255],
            jitter_color: true,
            temperature: (26.0, 38.0),
            life: (15.0, 30.0),
            ..Default::default()
        });
    }

    pub fn get(&self, material: Material) -> &MaterialDef {
        &self.materials[material.id() as usize]
    }

    /// Category used to select a movement rule
    pub fn category_of(&self, material: Material) -> MaterialType {
        self.get(material).material_type
    }

    /// Build a freshly initialized cell of `material`
    ///
    /// Temperature, life and color are drawn from the material's bands.
    /// Zero-width bands (empty, border) consume no randomness.
    pub fn create<R: WorldRng>(&self, material: Material, rng: &mut R) -> Cell {
        let def = self.get(material);
        let base = def.base_color();
        let color = if def.jitter_color {
            color::jitter(base, rng)
        } else {
            base
        };

        Cell {
            material,
            color,
            temperature: sample_band(def.temperature, rng),
            life: sample_band(def.life, rng),
            ..Cell::EMPTY
        }
    }

    /// Empty cell, without randomness
    pub fn empty(&self) -> Cell {
        self.create_fixed(Material::Empty)
    }

    pub fn border(&self) -> Cell {
        self.create_fixed(Material::Border)
    }

    fn create_fixed(&self, material: Material) -> Cell {
        let def = self.get(material);
        Cell {
            material,
            color: def.base_color(),
            temperature: def.temperature.0,
            life: def.life.0,
            ..Cell::EMPTY
        }
    }
}

impl Default for Materials {
    fn default() -> Self {
        Self::new()
    }
}

fn sample_band<R: WorldRng>((min, max): (f32, f32), rng: &mut R) -> f32 {
    if max <= min {
        min
    } else {
        rng.gen_range(min, max)
    }
}
