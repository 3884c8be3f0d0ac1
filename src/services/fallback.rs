//! Built-in data served when the remote API cannot be read.

use crate::domain::form_options::{ConsultantOption, FormOptions, PlanOption};
use crate::domain::record::{Record, RecordFormData};
use crate::domain::types::{Esteira, Migration, RecordId};

fn consultant(name: &str, team: &str) -> ConsultantOption {
    ConsultantOption {
        name: name.to_string(),
        team: team.to_string(),
    }
}

fn plan(name: &str, price: f64) -> PlanOption {
    PlanOption {
        name: name.to_string(),
        price,
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// Form options used when `/config` is unavailable.
pub fn form_options() -> FormOptions {
    FormOptions {
        consultants: vec![
            consultant("Ana Souza", "Equipe Alfa"),
            consultant("Bruno Lima", "Equipe Alfa"),
            consultant("Carla Mendes", "Equipe Beta"),
            consultant("Diego Rocha", "Equipe Gama"),
        ],
        plans: vec![
            plan("Plano Básico", 99.90),
            plan("Plano Intermediário", 149.90),
            plan("Plano Avançado", 199.90),
            plan("Plano Empresarial", 299.90),
        ],
        services: strings(&["Voz", "Dados", "Voz + Dados", "Fibra"]),
        addon_packages: strings(&["Nenhum", "Backup em Nuvem", "Gestão de Frota", "Segurança"]),
        statuses: strings(&["Ativo", "Pendente", "Inativo"]),
    }
}

struct Sample {
    id: &'static str,
    esteira: Esteira,
    uf: &'static str,
    ddd: &'static str,
    razao_social: &'static str,
    cnpj: &'static str,
    plano: &'static str,
    valor_do_plano: f64,
    quantidade_aparelho: u32,
    status: &'static str,
    consultor: &'static str,
    equipe: &'static str,
    migracao: Migration,
}

const SAMPLES: [Sample; 3] = [
    Sample {
        id: "mock-0001",
        esteira: Esteira::Mobile,
        uf: "SP",
        ddd: "11",
        razao_social: "Comercial Horizonte Ltda",
        cnpj: "12.345.678/0001-90",
        plano: "Plano Básico",
        valor_do_plano: 99.90,
        quantidade_aparelho: 5,
        status: "Ativo",
        consultor: "Ana Souza",
        equipe: "Equipe Alfa",
        migracao: Migration::No,
    },
    Sample {
        id: "mock-0002",
        esteira: Esteira::Fixed,
        uf: "RJ",
        ddd: "21",
        razao_social: "Transportes Litoral S.A.",
        cnpj: "98.765.432/0001-10",
        plano: "Plano Empresarial",
        valor_do_plano: 299.90,
        quantidade_aparelho: 20,
        status: "Pendente",
        consultor: "Carla Mendes",
        equipe: "Equipe Beta",
        migracao: Migration::Yes,
    },
    Sample {
        id: "mock-0003",
        esteira: Esteira::Energy,
        uf: "MG",
        ddd: "31",
        razao_social: "Padaria Pão Dourado ME",
        cnpj: "11.222.333/0001-44",
        plano: "Plano Intermediário",
        valor_do_plano: 149.90,
        quantidade_aparelho: 2,
        status: "Inativo",
        consultor: "Diego Rocha",
        equipe: "Equipe Gama",
        migracao: Migration::Unset,
    },
];

/// Records shown when `/crm/records` is unavailable. Never empty.
pub fn records() -> Vec<Record> {
    SAMPLES
        .iter()
        .filter_map(|sample| {
            let id = RecordId::new(sample.id).ok()?;
            let monthly = sample.valor_do_plano;
            Some(Record {
                id,
                data: RecordFormData {
                    esteira: sample.esteira,
                    uf: sample.uf.to_string(),
                    ddd: sample.ddd.to_string(),
                    razao_social: sample.razao_social.to_string(),
                    cnpj: sample.cnpj.to_string(),
                    servicos: "Voz + Dados".to_string(),
                    plano: sample.plano.to_string(),
                    valor_do_plano: monthly,
                    quantidade_aparelho: sample.quantidade_aparelho,
                    valor_atual: monthly,
                    valor_da_renovacao: monthly,
                    migracao: sample.migracao,
                    base_fresh: "base".to_string(),
                    qtd: sample.quantidade_aparelho,
                    status: sample.status.to_string(),
                    consultor: sample.consultor.to_string(),
                    equipe: sample.equipe.to_string(),
                    ..RecordFormData::default()
                },
                created_at: None,
                updated_at: None,
            })
        })
        .collect()
}
