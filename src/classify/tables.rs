// src/classify/tables.rs
//
// SIGTAP procedure table extracts. Codes are the exact strings found in the
// CIHA `PROC_REA` column.

/// First two digits of a procedure code → group name.
pub(crate) static GROUPS: &[(&str, &str)] = &[
    ("01", "Ações de promoção e prevenção em saúde"),
    ("02", "Procedimentos com finalidade diagnóstica"),
    ("03", "Procedimentos clínicos"),
    ("04", "Procedimentos cirúrgicos"),
    ("05", "Transplantes de orgãos, tecidos e células"),
    ("06", "Medicamentos"),
    ("07", "Órteses, próteses e materiais especiais"),
    ("08", "Ações complementares da atenção à saúde"),
    ("09", "Procedimentos para Ofertas de Cuidados Integrados"),
];

/// Subgroups per group. Only the diagnostic group is catalogued.
pub(crate) static SUBGROUPS: &[(&str, &[(&str, &str)])] = &[("02", DIAGNOSTIC_SUBGROUPS)];

static DIAGNOSTIC_SUBGROUPS: &[(&str, &str)] = &[
    ("01", "Coleta de material"),
    ("02", "Diagnóstico em laboratório clínico"),
    ("03", "Diagnóstico por anatomia patológica e citopatologia"),
    ("04", "Diagnóstico por radiologia"),
    ("05", "Diagnóstico por ultrassonografia"),
    ("06", "Diagnóstico por tomografia"),
    ("07", "Diagnóstico por ressonância magnética"),
    ("08", "Diagnóstico por medicina nuclear in vivo"),
    ("09", "Diagnóstico por endoscopia"),
    ("10", "Diagnóstico por radiologia intervencionista"),
    ("11", "Métodos diagnósticos em especialidades"),
    ("12", "Diagnóstico e procedimentos especiais em hemoterapia"),
    ("13", "Diagnóstico em vigilância epidemiológica e ambiental"),
    ("14", "Diagnóstico por teste rápido"),
];

/// Subgroup name → short category label used in reports.
pub(crate) static CATEGORIES: &[(&str, &str)] = &[
    ("Diagnóstico por ressonância magnética", "RM"),
    ("Diagnóstico por tomografia", "TC"),
    ("Diagnóstico por radiologia", "RX"),
    ("Diagnóstico por ultrassonografia", "US"),
    ("Diagnóstico por medicina nuclear in vivo", "Medicina Nuclear"),
    ("Diagnóstico por endoscopia", "Endoscopia"),
    ("Diagnóstico em laboratório clínico", "Laboratório Clínico"),
    ("Coleta de material", "Coleta de Material"),
    (
        "Diagnóstico por anatomia patológica e citopatologia",
        "Anatomia Patológica/Citopatologia",
    ),
    (
        "Diagnóstico por radiologia intervencionista",
        "Radiologia Intervencionista",
    ),
    (
        "Métodos diagnósticos em especialidades",
        "Diagnóstico em Especialidades",
    ),
    (
        "Diagnóstico e procedimentos especiais em hemoterapia",
        "Hemoterapia",
    ),
    (
        "Diagnóstico em vigilância epidemiológica e ambiental",
        "Vigilância Epidemiológica/Ambiental",
    ),
    ("Diagnóstico por teste rápido", "Teste Rápido"),
];

const HEAD_NECK: &str = "Cabeça e pescoço";
const TRUNK: &str = "Torax / abdomen / cintura / pelve";
const UPPER_LIMBS: &str = "Membros superiores";
const LOWER_LIMBS: &str = "Membros inferiores";

/// Full procedure code → anatomical region, for MRI, CT and radiography.
pub(crate) static BODY_REGIONS: &[(&str, &str)] = &[
    // RM cabeça, pescoço e coluna (020701)
    ("0207010013", HEAD_NECK),   // angiorressonância cerebral
    ("0207010021", HEAD_NECK),   // ATM bilateral
    ("0207010030", HEAD_NECK),   // coluna cervical
    ("0207010048", TRUNK),       // coluna lombo-sacra
    ("0207010056", TRUNK),       // coluna torácica
    ("0207010064", HEAD_NECK),   // crânio
    ("0207010072", HEAD_NECK),   // sela túrcica
    // RM tórax e membros superiores (020702)
    ("0207020019", TRUNK),       // coração / aorta c/ cine
    ("0207020027", UPPER_LIMBS), // membro superior
    ("0207020035", TRUNK),       // tórax
    // RM abdômen, pelve e membros inferiores (020703)
    ("0207030014", TRUNK),       // abdômen superior
    ("0207030022", TRUNK),       // bacia / pelve
    ("0207030030", LOWER_LIMBS), // membro inferior
    ("0207030049", TRUNK),       // vias biliares
    // TC cabeça, pescoço e coluna (020601)
    ("0206010010", HEAD_NECK),   // coluna cervical
    ("0206010028", TRUNK),       // coluna lombo-sacra
    ("0206010036", TRUNK),       // coluna torácica
    ("0206010044", HEAD_NECK),   // face / seios da face / ATM
    ("0206010052", HEAD_NECK),   // pescoço
    ("0206010060", HEAD_NECK),   // sela túrcica
    ("0206010079", HEAD_NECK),   // crânio
    ("0206010087", HEAD_NECK),   // tomomielografia
    // TC tórax e membros superiores (020602)
    ("0206020015", UPPER_LIMBS), // articulações de membro superior
    ("0206020023", UPPER_LIMBS), // segmentos apendiculares
    ("0206020031", TRUNK),       // tórax
    ("0206020040", TRUNK),       // hemitórax / mediastino
    // TC abdômen, pelve e membros inferiores (020603)
    ("0206030010", TRUNK),       // abdômen
    ("0206030029", LOWER_LIMBS), // articulações de membro inferior
    ("0206030037", TRUNK),       // pelve / bacia
    // RX cabeça e pescoço (020401)
    ("0204010012", HEAD_NECK),
    ("0204010020", HEAD_NECK),
    ("0204010055", HEAD_NECK),
    ("0204010063", HEAD_NECK),
    ("0204010071", HEAD_NECK),
    ("0204010080", HEAD_NECK),
    ("0204010101", HEAD_NECK),
    ("0204010110", HEAD_NECK),
    ("0204010128", HEAD_NECK),
    ("0204010144", HEAD_NECK),
    ("0204010152", HEAD_NECK),
    ("0204010179", HEAD_NECK),
    ("0204010187", HEAD_NECK),
    ("0204010195", HEAD_NECK),
    // RX coluna vertebral (020402)
    ("0204020018", HEAD_NECK),   // mielografia
    ("0204020034", HEAD_NECK),   // coluna cervical
    ("0204020042", HEAD_NECK),   // coluna cervical (flexão)
    ("0204020069", TRUNK),
    ("0204020077", TRUNK),
    ("0204020093", TRUNK),
    ("0204020107", TRUNK),
    ("0204020123", TRUNK),
    // RX tórax e mediastino (020403)
    ("0204030013", TRUNK),
    ("0204030021", TRUNK),
    ("0204030030", TRUNK),       // mamografia unilateral
    ("0204030048", TRUNK),
    ("0204030072", TRUNK),
    ("0204030110", TRUNK),
    ("0204030137", TRUNK),
    ("0204030145", TRUNK),
    ("0204030153", TRUNK),
    ("0204030161", TRUNK),
    ("0204030170", TRUNK),       // tórax (PA)
    ("0204030188", TRUNK),       // mamografia bilateral de rastreamento
    // RX cintura escapular e membros superiores (020404)
    ("0204040019", UPPER_LIMBS),
    ("0204040027", TRUNK),       // acromioclavicular
    ("0204040035", UPPER_LIMBS),
    ("0204040043", TRUNK),       // esternoclavicular
    ("0204040051", UPPER_LIMBS),
    ("0204040060", TRUNK),       // clavícula
    ("0204040078", UPPER_LIMBS),
    ("0204040086", UPPER_LIMBS),
    ("0204040094", UPPER_LIMBS),
    ("0204040108", UPPER_LIMBS),
    ("0204040116", UPPER_LIMBS),
    ("0204040124", UPPER_LIMBS),
    // RX abdômen e pelve (020405)
    ("0204050073", TRUNK),
    ("0204050090", TRUNK),
    ("0204050138", TRUNK),
    // RX cintura pélvica e membros inferiores (020406)
    ("0204060010", LOWER_LIMBS), // artrografia
    ("0204060028", TRUNK),       // densitometria de coluna
    ("0204060036", LOWER_LIMBS),
    ("0204060060", LOWER_LIMBS),
    ("0204060079", TRUNK),       // sacroilíaca
    ("0204060087", LOWER_LIMBS),
    ("0204060095", TRUNK),       // bacia
    ("0204060109", LOWER_LIMBS),
    ("0204060117", LOWER_LIMBS),
    ("0204060125", LOWER_LIMBS),
    ("0204060133", LOWER_LIMBS),
    ("0204060150", LOWER_LIMBS),
    ("0204060168", LOWER_LIMBS),
];
