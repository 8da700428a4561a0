use rand::Rng;

pub const TOPICS: &[&str] = &[
    // Mindfulness y meditación
    "Meditación y respiración consciente",
    "Atención plena en el momento presente",
    "Mindfulness en la vida cotidiana",
    "Meditación guiada y visualización",
    "Respiración pranayama y energía vital",
    // Ayurveda
    "Ayurveda y equilibrio de doshas",
    "Alimentación ayurvédica consciente",
    "Rutinas diarias según Ayurveda (Dinacharya)",
    "Los cinco elementos y su equilibrio",
    "Plantas medicinales ayurvédicas",
    "Masaje ayurvédico y autocuidado",
    // Neoespiritualidad y bienestar
    "Chakras y energía interior",
    "Ley de atracción y manifestación",
    "Gratitud y abundancia",
    "Sanación energética y reiki",
    "Cristales y piedras sanadoras",
    "Luna llena y rituales de liberación",
    "Afirmaciones positivas y reprogramación mental",
    "Conexión con el universo",
    // Hinduismo y filosofía
    "Karma y dharma en la vida diaria",
    "Los Vedas y sabiduría ancestral",
    "Bhagavad Gita y enseñanzas espirituales",
    "Moksha y liberación del alma",
    "Yoga como filosofía de vida",
    "Samsara y el ciclo de renacimiento",
    // Dioses hindúes
    "Shiva: transformación y destrucción creativa",
    "Ganesha: remoción de obstáculos",
    "Lakshmi: abundancia y prosperidad",
    "Saraswati: sabiduría y conocimiento",
    "Krishna: amor divino y devoción",
    "Durga: fuerza interior y protección",
    "Hanuman: devoción y servicio desinteresado",
    "Vishnu: preservación y equilibrio",
    "Kali: transformación radical y renacimiento",
    "Brahma: creación y manifestación",
    // Prácticas espirituales
    "Mantras sagrados y su poder",
    "Puja y rituales de devoción",
    "Japa mala y meditación con cuentas",
    "Kirtan y canto devocional",
    "Bhakti yoga: el camino del amor",
    "Karma yoga: acción desinteresada",
    "Jnana yoga: conocimiento y discernimiento",
    // Conceptos espirituales
    "Ahimsa: no violencia y compasión",
    "Satya: verdad y autenticidad",
    "Santosha: contentamiento interior",
    "Tapas: disciplina espiritual",
    "Svadhyaya: autoconocimiento",
    "Namaste: honrar lo divino en todos",
];

/// Stock-media search terms for background footage.
pub const SEARCH_TERMS: &[&str] = &[
    "mindfulness",
    "yoga",
    "meditation",
    "zen",
    "spiritual",
    "hindu",
    "La India",
    "karma",
    "dharma",
    "hinduismo",
    "budismo",
];

/// Uniform pick from a non-empty catalog.
pub fn pick_topic<'a, R: Rng + ?Sized>(catalog: &[&'a str], rng: &mut R) -> Option<&'a str> {
    if catalog.is_empty() {
        return None;
    }
    Some(catalog[rng.gen_range(0..catalog.len())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn catalog_has_no_duplicates() {
        let unique: HashSet<_> = TOPICS.iter().collect();
        assert_eq!(unique.len(), TOPICS.len());
        assert_eq!(TOPICS.len(), 49);
    }

    #[test]
    fn same_seed_same_topic() {
        let a = pick_topic(TOPICS, &mut StdRng::seed_from_u64(7));
        let b = pick_topic(TOPICS, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert!(TOPICS.contains(&a.unwrap()));
    }

    #[test]
    fn picks_cover_the_catalog() {
        let mut rng = StdRng::seed_from_u64(42);
        let catalog = ["a", "b", "c"];
        let seen: HashSet<_> = (0..200)
            .filter_map(|_| pick_topic(&catalog, &mut rng))
            .collect();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn empty_catalog_yields_none() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(pick_topic(&[], &mut rng), None);
    }
}
